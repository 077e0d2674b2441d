//! Read-only data sources.
//!
//! Each data source accepts `id` XOR `name` (some also `partial_match`),
//! resolves the object through [`crate::resolve`], and reuses its resource's
//! mapping function to build the attribute map.

pub mod certificate;
pub mod dns_zone;
pub mod lan;
pub mod logging_pipeline;
pub mod network_loadbalancer;
pub mod network_security_group;
pub mod pg_cluster;
pub mod server;
pub mod vpn_wireguard_gateway;

use serde_json::Value;

use crate::api::IonosClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Kind, Schema};

/// A read-only lookup of existing cloud state.
#[async_trait::async_trait]
pub trait DataSourceHandler: Send + Sync {
    /// The data source type name, e.g. `ionoscloud_server`.
    fn type_name(&self) -> &'static str;

    /// The data source schema.
    fn schema(&self) -> Schema;

    /// Resolve and read the object described by `config`.
    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError>;
}

/// Every registered data source type, in registry order.
pub fn all() -> Vec<Box<dyn DataSourceHandler>> {
    vec![
        Box::new(server::ServerDataSource),
        Box::new(lan::LanDataSource),
        Box::new(network_loadbalancer::NetworkLoadBalancerDataSource),
        Box::new(network_security_group::NetworkSecurityGroupDataSource),
        Box::new(dns_zone::DnsZoneDataSource),
        Box::new(logging_pipeline::LoggingPipelineDataSource),
        Box::new(vpn_wireguard_gateway::WireguardGatewayDataSource),
        Box::new(pg_cluster::PgClusterDataSource),
        Box::new(certificate::CertificateDataSource),
    ]
}

/// The selector attributes every data source starts from.
pub(crate) fn selector_schema() -> Schema {
    Schema::v0()
        .attr("id", Attribute::optional_computed(Kind::String))
        .attr("name", Attribute::optional_computed(Kind::String))
        .attr("partial_match", Attribute::optional(Kind::Bool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_unique_type_names() {
        let handlers = all();
        let mut names: Vec<&str> = handlers.iter().map(|h| h.type_name()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_every_schema_accepts_id_and_name() {
        for handler in all() {
            let schema = handler.schema();
            for key in ["id", "name"] {
                let attr = schema
                    .block
                    .attributes
                    .get(key)
                    .unwrap_or_else(|| panic!("{} schema has no {}", handler.type_name(), key));
                assert!(
                    attr.usage.accepts_input(),
                    "{} {} must accept input",
                    handler.type_name(),
                    key
                );
            }
        }
    }
}
