//! The `ionoscloud_pg_cluster` data source.
//!
//! Clusters are matched on `display_name`; the attribute is still called
//! `name` on the data source for consistency with the other lookups.

use serde_json::Value;

use crate::api::{dbaas, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::pg_cluster::cluster_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct PgClusterDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for PgClusterDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_pg_cluster"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("display_name", Attribute::computed(Kind::String))
            .attr("postgres_version", Attribute::computed(Kind::String))
            .attr("location", Attribute::computed(Kind::String))
            .attr("instances", Attribute::computed(Kind::Int64))
            .attr("cores", Attribute::computed(Kind::Int64))
            .attr("ram", Attribute::computed(Kind::Int64))
            .attr("storage_size", Attribute::computed(Kind::Int64))
            .attr("dns_name", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let selector = Selector::from_config("postgres cluster", &config)?;

        let cluster = match selector.id() {
            Some(id) => match dbaas::get_cluster(api, id).await {
                Ok(cluster) => cluster,
                Err(e) if e.is_not_found() => {
                    return Err(not_found_by_id("postgres cluster", id))
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = dbaas::list_clusters(api).await?;
                exactly_one("postgres cluster", &selector, listing.items, |cluster| {
                    cluster
                        .properties
                        .as_ref()
                        .and_then(|p| p.display_name.as_deref())
                })?
            }
        };

        Ok(cluster_to_state(&cluster, &Value::Null))
    }
}
