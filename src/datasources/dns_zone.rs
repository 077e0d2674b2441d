//! The `ionoscloud_dns_zone` data source.

use serde_json::Value;

use crate::api::{dns, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::dns_zone::zone_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct DnsZoneDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for DnsZoneDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_dns_zone"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("description", Attribute::computed(Kind::String))
            .attr("enabled", Attribute::computed(Kind::Bool))
            .attr(
                "nameservers",
                Attribute::computed(Kind::list(Kind::String)),
            )
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let selector = Selector::from_config("zone", &config)?;

        let zone = match selector.id() {
            Some(id) => match dns::get_zone(api, id).await {
                Ok(zone) => zone,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("zone", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = dns::list_zones(api).await?;
                exactly_one("zone", &selector, listing.items, |zone| {
                    zone.properties.as_ref().and_then(|p| p.zone_name.as_deref())
                })?
            }
        };

        Ok(zone_to_state(&zone, &Value::Null))
    }
}
