//! Template resolver backed by `[[templates]]` from the config file
//!
//! A template applies to every station of its vendor, or to one model of
//! that vendor. The first template in file order wins.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::domain::{ChargingStation, DomainResult, Tenant, TemplateResolver, TemplateUpdateResult};

/// One `[[templates]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    pub vendor: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub ocpp_parameters: BTreeMap<String, String>,
}

impl TemplateConfig {
    fn matches(&self, station: &ChargingStation) -> bool {
        let vendor_matches = station
            .vendor
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case(&self.vendor));
        let model_matches = match &self.model {
            Some(model) => station.model.as_deref() == Some(model.as_str()),
            None => true,
        };
        vendor_matches && model_matches
    }
}

struct CompiledTemplate {
    config: TemplateConfig,
    hash: String,
}

pub struct StaticTemplateResolver {
    templates: Vec<CompiledTemplate>,
}

impl StaticTemplateResolver {
    pub fn new(templates: Vec<TemplateConfig>) -> Self {
        let templates = templates
            .into_iter()
            .map(|config| CompiledTemplate {
                hash: template_hash(&config),
                config,
            })
            .collect();
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn find(&self, station: &ChargingStation) -> Option<&CompiledTemplate> {
        self.templates.iter().find(|t| t.config.matches(station))
    }
}

/// Lowercase hex SHA-256 over the template's serialized form. Parameters
/// are a `BTreeMap` so the form is stable.
fn template_hash(config: &TemplateConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.vendor.as_bytes());
    hasher.update(b"\x00");
    hasher.update(config.model.as_deref().unwrap_or_default().as_bytes());
    for (key, value) in &config.ocpp_parameters {
        hasher.update(b"\x00");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[async_trait]
impl TemplateResolver for StaticTemplateResolver {
    async fn apply_if_needed(
        &self,
        tenant: &Tenant,
        station: &mut ChargingStation,
    ) -> DomainResult<TemplateUpdateResult> {
        if station.manual_configuration {
            return Ok(TemplateUpdateResult::unchanged());
        }
        let Some(template) = self.find(station) else {
            debug!(
                tenant_id = %tenant.id,
                charging_station_id = %station.id,
                vendor = ?station.vendor,
                "No template matches charging station"
            );
            return Ok(TemplateUpdateResult::unchanged());
        };
        if station.template_hash.as_deref() == Some(template.hash.as_str()) {
            return Ok(TemplateUpdateResult::unchanged());
        }

        station.ocpp_parameters.extend(
            template
                .config
                .ocpp_parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        station.template_hash = Some(template.hash.clone());

        info!(
            tenant_id = %tenant.id,
            charging_station_id = %station.id,
            template = %template.config.name,
            parameters = template.config.ocpp_parameters.len(),
            "📋 Template applied to charging station"
        );
        Ok(TemplateUpdateResult::updated())
    }
}
