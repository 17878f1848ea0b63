//! Identifier newtypes for tenants and records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CoreError;

/// Maximum accepted length for a tenant identifier.
const MAX_TENANT_ID_LEN: usize = 64;

/// A validated tenant identifier.
///
/// Tenant identifiers end up embedded in partition database names, so the
/// accepted alphabet is restricted to characters that are safe in database
/// names and connection URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String")]
#[schema(value_type = String, example = "acme")]
pub struct TenantId(String);

impl TenantId {
    /// Validate a raw tenant identifier.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::invalid_identifier("tenant id must not be empty"));
        }
        if raw.len() > MAX_TENANT_ID_LEN {
            return Err(CoreError::invalid_identifier(format!(
                "tenant id must be at most {MAX_TENANT_ID_LEN} characters"
            )));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(CoreError::invalid_identifier(
                "tenant id may only contain letters, digits, hyphens and underscores",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl FromStr for TenantId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primary key for employee, task and KPI records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, example = "0d4d5b66-3a7e-4f8e-9c41-2d1a41f1b0aa")]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a path identifier, rejecting anything that is not a UUID.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(raw).map(Self).map_err(|_| {
            CoreError::invalid_identifier(format!("'{raw}' is not a valid record id"))
        })
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slug_tenant_ids() {
        assert!(TenantId::new("acme").is_ok());
        assert!(TenantId::new("acme-west_2").is_ok());
        assert!(TenantId::new("A1").is_ok());
    }

    #[test]
    fn rejects_empty_tenant_id() {
        assert!(TenantId::new("").is_err());
    }

    #[test]
    fn rejects_overlong_tenant_id() {
        let raw = "a".repeat(MAX_TENANT_ID_LEN + 1);
        assert!(TenantId::new(&raw).is_err());
    }

    #[test]
    fn rejects_unsafe_characters() {
        assert!(TenantId::new("acme corp").is_err());
        assert!(TenantId::new("acme/../../etc").is_err());
        assert!(TenantId::new("acme;drop").is_err());
    }

    #[test]
    fn record_id_round_trips_through_display() {
        let id = RecordId::generate();
        let parsed = RecordId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn record_id_rejects_non_uuid_input() {
        assert!(RecordId::parse("not-a-uuid").is_err());
        assert!(RecordId::parse("").is_err());
    }
}
