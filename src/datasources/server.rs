//! The `ionoscloud_server` data source.

use serde_json::Value;

use crate::api::{compute, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::require_str;
use crate::resources::server::server_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct ServerDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for ServerDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_server"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("datacenter_id", Attribute::required(Kind::String))
            .attr("cores", Attribute::computed(Kind::Int64))
            .attr("ram", Attribute::computed(Kind::Int64))
            .attr("availability_zone", Attribute::computed(Kind::String))
            .attr("cpu_family", Attribute::computed(Kind::String))
            .attr("vm_state", Attribute::computed(Kind::String))
            .attr("boot_volume", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&config, "datacenter_id")?;
        let selector = Selector::from_config("server", &config)?;

        let server = match selector.id() {
            Some(id) => match compute::get_server(api, &dc, id).await {
                Ok(server) => server,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("server", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = compute::list_servers(api, &dc).await?;
                exactly_one("server", &selector, listing.items, |server| {
                    server.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(server_to_state(&dc, &server, &Value::Null))
    }
}
