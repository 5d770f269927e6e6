//! OCPP protocol version negotiation
//!
//! During the WebSocket handshake the charging station advertises which OCPP
//! sub-protocols it supports via the `Sec-WebSocket-Protocol` header.
//! The negotiator picks the best mutually-supported version.

use tracing::warn;

use crate::domain::OcppVersion;

/// Picks the highest version both the station and the gateway support.
#[derive(Debug, Clone)]
pub struct ProtocolNegotiator {
    /// Highest first
    supported_versions: Vec<OcppVersion>,
}

impl ProtocolNegotiator {
    pub fn new(mut supported_versions: Vec<OcppVersion>) -> Self {
        supported_versions.sort_by_key(|v| std::cmp::Reverse(v.rank()));
        supported_versions.dedup();
        Self { supported_versions }
    }

    /// Build from configured subprotocol names. Unknown names are skipped.
    pub fn from_subprotocols<S: AsRef<str>>(names: &[S]) -> Self {
        let versions = names
            .iter()
            .filter_map(|name| {
                let version = OcppVersion::from_subprotocol(name.as_ref());
                if version.is_none() {
                    warn!(subprotocol = name.as_ref(), "Ignoring unknown OCPP subprotocol");
                }
                version
            })
            .collect();
        Self::new(versions)
    }

    /// Negotiate from the `Sec-WebSocket-Protocol` header value.
    pub fn negotiate(&self, requested_protocols: &str) -> Option<OcppVersion> {
        let requested: Vec<&str> = requested_protocols.split(',').map(|s| s.trim()).collect();

        self.supported_versions
            .iter()
            .copied()
            .find(|version| requested.iter().any(|p| *p == version.subprotocol()))
    }

    pub fn supported_versions(&self) -> &[OcppVersion] {
        &self.supported_versions
    }

    pub fn supported_subprotocols(&self) -> Vec<&'static str> {
        self.supported_versions
            .iter()
            .map(|v| v.subprotocol())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_single_match() {
        let negotiator = ProtocolNegotiator::new(vec![OcppVersion::V16]);
        assert_eq!(negotiator.negotiate("ocpp1.6"), Some(OcppVersion::V16));
    }

    #[test]
    fn negotiate_multiple_prefers_highest() {
        let negotiator =
            ProtocolNegotiator::new(vec![OcppVersion::V16, OcppVersion::V21, OcppVersion::V201]);
        assert_eq!(
            negotiator.negotiate("ocpp1.6, ocpp2.0.1"),
            Some(OcppVersion::V201)
        );
    }

    #[test]
    fn negotiate_no_match() {
        let negotiator = ProtocolNegotiator::new(vec![OcppVersion::V16]);
        assert_eq!(negotiator.negotiate("ocpp2.0.1"), None);
        assert_eq!(negotiator.negotiate(""), None);
    }

    #[test]
    fn from_config_names_skips_unknown() {
        let negotiator = ProtocolNegotiator::from_subprotocols(&["ocpp1.6", "ocpp9"]);
        assert_eq!(negotiator.supported_subprotocols(), ["ocpp1.6"]);
    }
}
