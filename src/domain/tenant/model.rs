//! Tenant domain entity

use std::fmt;

/// An isolated customer namespace. Every lock, record and session
/// belongs to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tenant {
    pub id: String,
    pub subdomain: String,
    pub name: String,
}

impl Tenant {
    pub fn new(id: impl Into<String>, subdomain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subdomain: subdomain.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.subdomain)
    }
}
