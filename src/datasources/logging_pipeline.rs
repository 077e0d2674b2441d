//! The `ionoscloud_logging_pipeline` data source.

use serde_json::Value;

use crate::api::{logs, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::logging_pipeline::pipeline_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct LoggingPipelineDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for LoggingPipelineDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_logging_pipeline"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("location", Attribute::computed(Kind::String))
            .attr("tcp_address", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let selector = Selector::from_config("pipeline", &config)?;

        let pipeline = match selector.id() {
            Some(id) => match logs::get_pipeline(api, id).await {
                Ok(pipeline) => pipeline,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("pipeline", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = logs::list_pipelines(api).await?;
                exactly_one("pipeline", &selector, listing.items, |pipeline| {
                    pipeline.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(pipeline_to_state(&pipeline, &Value::Null))
    }
}
