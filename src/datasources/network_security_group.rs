//! The `ionoscloud_network_security_group` data source.

use serde_json::Value;

use crate::api::{compute, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::network_security_group::group_to_state;
use crate::resources::require_str;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct NetworkSecurityGroupDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for NetworkSecurityGroupDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_network_security_group"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("datacenter_id", Attribute::required(Kind::String))
            .attr("description", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&config, "datacenter_id")?;
        let selector = Selector::from_config("security group", &config)?;

        let group = match selector.id() {
            Some(id) => match compute::get_security_group(api, &dc, id).await {
                Ok(group) => group,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("security group", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = compute::list_security_groups(api, &dc).await?;
                exactly_one("security group", &selector, listing.items, |group| {
                    group.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(group_to_state(&dc, &group, &Value::Null))
    }
}
