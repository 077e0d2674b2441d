//! Managed resources.
//!
//! One module per resource type; each pairs a declarative schema with the
//! CRUD handlers that translate attribute maps into IONOS API calls and API
//! responses back into attribute maps.

pub mod certificate;
pub mod dns_record;
pub mod dns_zone;
pub mod lan;
pub mod logging_pipeline;
pub mod network_loadbalancer;
pub mod network_security_group;
pub mod pg_cluster;
pub mod server;
pub mod vpn_wireguard_gateway;
pub mod vpn_wireguard_peer;

use serde_json::Value;

use crate::api::IonosClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::Readiness;

/// A managed resource type: schema plus CRUD against the IONOS API.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource type name, e.g. `ionoscloud_server`.
    fn type_name(&self) -> &'static str;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// Create the remote object and return the full state.
    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the API; `Value::Null` means the object is gone.
    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError>;

    /// Update the remote object and return the full state.
    async fn update(
        &self,
        api: &IonosClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object and wait until it is gone.
    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError>;

    /// Build state from a composite import identifier.
    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError>;
}

/// Every registered resource type, in registry order.
pub fn all() -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(server::ServerResource),
        Box::new(lan::LanResource),
        Box::new(network_loadbalancer::NetworkLoadBalancerResource),
        Box::new(network_security_group::NetworkSecurityGroupResource),
        Box::new(dns_zone::DnsZoneResource),
        Box::new(dns_record::DnsRecordResource),
        Box::new(logging_pipeline::LoggingPipelineResource),
        Box::new(vpn_wireguard_gateway::WireguardGatewayResource),
        Box::new(vpn_wireguard_peer::WireguardPeerResource),
        Box::new(pg_cluster::PgClusterResource),
        Box::new(certificate::CertificateResource),
    ]
}

// =============================================================================
// Shared schema pieces
// =============================================================================

/// The `timeouts` block every waiting resource carries.
pub(crate) fn timeouts_block() -> NestedBlock {
    NestedBlock::single(
        Block::new()
            .attr("create", Attribute::optional(Kind::String))
            .attr("update", Attribute::optional(Kind::String))
            .attr("delete", Attribute::optional(Kind::String))
            .describe("per-operation wait budgets, e.g. \"10m\" or \"1h30m\""),
    )
}

// =============================================================================
// Configuration readers
// =============================================================================

pub(crate) fn require_str(config: &Value, key: &str) -> Result<String, ProviderError> {
    opt_str(config, key)
        .ok_or_else(|| ProviderError::Validation(format!("missing required attribute '{}'", key)))
}

pub(crate) fn opt_str(config: &Value, key: &str) -> Option<String> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn opt_i64(config: &Value, key: &str) -> Option<i64> {
    config.get(key).and_then(Value::as_i64)
}

pub(crate) fn opt_bool(config: &Value, key: &str) -> Option<bool> {
    config.get(key).and_then(Value::as_bool)
}

pub(crate) fn opt_str_list(config: &Value, key: &str) -> Option<Vec<String>> {
    config.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

// =============================================================================
// State builders
// =============================================================================

/// Insert `value` under `key` when present; absent values stay unset so the
/// attribute map mirrors exactly what the API reported.
pub(crate) fn set_opt<T: Into<Value>>(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
    value: Option<T>,
) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// Carry the `timeouts` block from the configured state into rebuilt state
/// so refresh does not plan its removal.
pub(crate) fn carry_timeouts(map: &mut serde_json::Map<String, Value>, config: &Value) {
    if let Some(timeouts) = config.get("timeouts").filter(|v| !v.is_null()) {
        map.insert("timeouts".to_string(), timeouts.clone());
    }
}

/// Map a lifecycle state onto waiter readiness: AVAILABLE is ready, FAILED
/// aborts, everything else keeps polling.
pub(crate) fn state_readiness(state: Option<&str>) -> Readiness<()> {
    match state {
        Some(crate::api::STATE_AVAILABLE) => Readiness::Ready(()),
        Some(crate::api::STATE_FAILED) => {
            Readiness::Failed("provisioning reported FAILED".to_string())
        }
        Some(other) => Readiness::Pending(other.to_string()),
        None => Readiness::Pending("UNKNOWN".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_has_unique_type_names() {
        let handlers = all();
        let mut names: Vec<&str> = handlers.iter().map(|h| h.type_name()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"ionoscloud_server"));
        assert!(names.contains(&"ionoscloud_network_loadbalancer"));
    }

    #[test]
    fn test_every_schema_has_computed_id() {
        for handler in all() {
            let schema = handler.schema();
            let id = schema
                .block
                .attributes
                .get("id")
                .unwrap_or_else(|| panic!("{} schema has no id", handler.type_name()));
            assert!(
                id.usage.is_computed(),
                "{} id must be computed",
                handler.type_name()
            );
        }
    }

    #[test]
    fn test_config_readers() {
        let config = json!({"name": "web", "cores": 2, "public": true, "ips": ["1.2.3.4"], "empty": ""});

        assert_eq!(require_str(&config, "name").unwrap(), "web");
        assert!(require_str(&config, "missing").is_err());
        assert!(require_str(&config, "empty").is_err());
        assert_eq!(opt_i64(&config, "cores"), Some(2));
        assert_eq!(opt_bool(&config, "public"), Some(true));
        assert_eq!(opt_str_list(&config, "ips").unwrap(), vec!["1.2.3.4"]);
        assert_eq!(opt_str_list(&config, "missing"), None);
    }

    #[test]
    fn test_set_opt_leaves_absent_values_unset() {
        let mut map = serde_json::Map::new();
        set_opt(&mut map, "present", Some("value"));
        set_opt::<String>(&mut map, "absent", None);

        assert_eq!(map.get("present"), Some(&json!("value")));
        assert!(!map.contains_key("absent"));
    }

    #[test]
    fn test_state_readiness() {
        assert!(matches!(state_readiness(Some("AVAILABLE")), Readiness::Ready(())));
        assert!(matches!(state_readiness(Some("FAILED")), Readiness::Failed(_)));
        assert!(matches!(state_readiness(Some("BUSY")), Readiness::Pending(_)));
        assert!(matches!(state_readiness(None), Readiness::Pending(_)));
    }
}
