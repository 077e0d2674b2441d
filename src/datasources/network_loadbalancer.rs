//! The `ionoscloud_network_loadbalancer` data source.

use serde_json::Value;

use crate::api::{nlb, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::network_loadbalancer::nlb_to_state;
use crate::resources::require_str;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct NetworkLoadBalancerDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for NetworkLoadBalancerDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_network_loadbalancer"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("datacenter_id", Attribute::required(Kind::String))
            .attr("listener_lan", Attribute::computed(Kind::Int64))
            .attr("target_lan", Attribute::computed(Kind::Int64))
            .attr("ips", Attribute::computed(Kind::list(Kind::String)))
            .attr(
                "lb_private_ips",
                Attribute::computed(Kind::list(Kind::String)),
            )
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&config, "datacenter_id")?;
        let selector = Selector::from_config("network load balancer", &config)?;

        let balancer = match selector.id() {
            Some(id) => match nlb::get_network_loadbalancer(api, &dc, id).await {
                Ok(balancer) => balancer,
                Err(e) if e.is_not_found() => {
                    return Err(not_found_by_id("network load balancer", id))
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = nlb::list_network_loadbalancers(api, &dc).await?;
                exactly_one("network load balancer", &selector, listing.items, |b| {
                    b.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(nlb_to_state(&dc, &balancer, &Value::Null))
    }
}
