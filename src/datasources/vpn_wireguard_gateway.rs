//! The `ionoscloud_vpn_wireguard_gateway` data source.

use serde_json::Value;

use crate::api::{vpn, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::vpn_wireguard_gateway::gateway_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct WireguardGatewayDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for WireguardGatewayDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_vpn_wireguard_gateway"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("description", Attribute::computed(Kind::String))
            .attr("location", Attribute::computed(Kind::String))
            .attr("gateway_ip", Attribute::computed(Kind::String))
            .attr("interface_ipv4_cidr", Attribute::computed(Kind::String))
            .attr("interface_ipv6_cidr", Attribute::computed(Kind::String))
            .attr("listen_port", Attribute::computed(Kind::Int64))
            .attr("public_key", Attribute::computed(Kind::String))
            .attr("status", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let selector = Selector::from_config("wireguard gateway", &config)?;

        let gateway = match selector.id() {
            Some(id) => match vpn::get_gateway(api, id).await {
                Ok(gateway) => gateway,
                Err(e) if e.is_not_found() => {
                    return Err(not_found_by_id("wireguard gateway", id))
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = vpn::list_gateways(api).await?;
                exactly_one("wireguard gateway", &selector, listing.items, |gateway| {
                    gateway.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(gateway_to_state(&gateway, &Value::Null))
    }
}
