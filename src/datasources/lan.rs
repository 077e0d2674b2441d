//! The `ionoscloud_lan` data source.

use serde_json::Value;

use crate::api::{compute, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::lan::lan_to_state;
use crate::resources::require_str;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct LanDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for LanDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_lan"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("datacenter_id", Attribute::required(Kind::String))
            .attr("public", Attribute::computed(Kind::Bool))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&config, "datacenter_id")?;
        let selector = Selector::from_config("lan", &config)?;

        let lan = match selector.id() {
            Some(id) => match compute::get_lan(api, &dc, id).await {
                Ok(lan) => lan,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("lan", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = compute::list_lans(api, &dc).await?;
                exactly_one("lan", &selector, listing.items, |lan| {
                    lan.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(lan_to_state(&dc, &lan, &Value::Null))
    }
}
