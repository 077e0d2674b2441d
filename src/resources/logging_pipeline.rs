//! The `ionoscloud_logging_pipeline` resource.

use serde_json::Value;

use crate::api::logs::{self, LogDestination, PipelineLog, PipelineProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct LoggingPipelineResource;

#[async_trait::async_trait]
impl ResourceHandler for LoggingPipelineResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_logging_pipeline"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr("name", Attribute::required(Kind::String))
            .attr("location", Attribute::optional(Kind::String).force_new())
            .attr("tcp_address", Attribute::computed(Kind::String))
            .nested(
                "log",
                NestedBlock::list(
                    Block::new()
                        .attr(
                            "source",
                            Attribute::required(Kind::String)
                                .describe("kubernetes, docker, systemd, or generic"),
                        )
                        .attr("tag", Attribute::required(Kind::String))
                        .attr("protocol", Attribute::required(Kind::String))
                        .nested(
                            "destination",
                            NestedBlock::list(
                                Block::new()
                                    .attr("type", Attribute::optional(Kind::String))
                                    .attr(
                                        "retention_in_days",
                                        Attribute::optional(Kind::Int64),
                                    ),
                            ),
                        ),
                )
                .at_least(1),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let timeouts = Timeouts::from_config(&planned)?;

        let created = logs::create_pipeline(api, pipeline_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("pipeline create response carried no id".to_string())
            })?
            .to_string();

        wait_pipeline_available(api, &id, timeouts.create).await?;

        let pipeline = logs::get_pipeline(api, &id).await?;
        Ok(pipeline_to_state(&pipeline, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let id = require_str(&state, "id")?;

        match logs::get_pipeline(api, &id).await {
            Ok(pipeline) => Ok(pipeline_to_state(&pipeline, &state)),
            Err(e) if e.is_not_found() => Ok(Value::Null),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        api: &IonosClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = require_str(&prior, "id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        logs::update_pipeline(api, &id, pipeline_from_config(&planned)).await?;
        wait_pipeline_available(api, &id, timeouts.update).await?;

        let pipeline = logs::get_pipeline(api, &id).await?;
        Ok(pipeline_to_state(&pipeline, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        logs::delete_pipeline(api, &id).await?;

        let probe = {
            let api = api.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let id = id.clone();
                async move {
                    match logs::get_pipeline(&api, &id).await {
                        Ok(pipeline) => Ok(Readiness::Pending(
                            pipeline.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "pipeline deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [pipeline_id] = import::parts::<1>(id, "pipeline_id")?;
        let pipeline = logs::get_pipeline(api, &pipeline_id).await?;
        Ok(pipeline_to_state(&pipeline, &Value::Null))
    }
}

fn pipeline_from_config(config: &Value) -> PipelineProperties {
    let streams: Vec<PipelineLog> = config
        .get("log")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .map(|block| PipelineLog {
                    source: opt_str(block, "source"),
                    tag: opt_str(block, "tag"),
                    protocol: opt_str(block, "protocol"),
                    destinations: block.get("destination").and_then(Value::as_array).map(
                        |destinations| {
                            destinations
                                .iter()
                                .map(|d| LogDestination {
                                    destination_type: opt_str(d, "type"),
                                    retention_in_days: opt_i64(d, "retention_in_days"),
                                })
                                .collect()
                        },
                    ),
                })
                .collect()
        })
        .unwrap_or_default();

    PipelineProperties {
        name: opt_str(config, "name"),
        location: opt_str(config, "location"),
        logs: (!streams.is_empty()).then_some(streams),
        ..Default::default()
    }
}

pub(crate) fn pipeline_to_state(pipeline: &Envelope<PipelineProperties>, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", pipeline.id.clone());
    if let Some(props) = &pipeline.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "location", props.location.clone());
        set_opt(&mut map, "tcp_address", props.tcp_address.clone());
        if let Some(streams) = &props.logs {
            let blocks: Vec<Value> = streams
                .iter()
                .map(|stream| {
                    let mut stream_map = serde_json::Map::new();
                    set_opt(&mut stream_map, "source", stream.source.clone());
                    set_opt(&mut stream_map, "tag", stream.tag.clone());
                    set_opt(&mut stream_map, "protocol", stream.protocol.clone());
                    if let Some(destinations) = &stream.destinations {
                        let destination_blocks: Vec<Value> = destinations
                            .iter()
                            .map(|d| {
                                let mut dest_map = serde_json::Map::new();
                                set_opt(&mut dest_map, "type", d.destination_type.clone());
                                set_opt(
                                    &mut dest_map,
                                    "retention_in_days",
                                    d.retention_in_days,
                                );
                                Value::Object(dest_map)
                            })
                            .collect();
                        stream_map.insert("destination".to_string(), destination_blocks.into());
                    }
                    Value::Object(stream_map)
                })
                .collect();
            map.insert("log".to_string(), blocks.into());
        }
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_pipeline_available(
    api: &IonosClient,
    id: &str,
    deadline: std::time::Duration,
) -> Result<(), ProviderError> {
    let probe = {
        let api = api.clone();
        let id = id.to_string();
        move || {
            let api = api.clone();
            let id = id.clone();
            async move {
                let pipeline = logs::get_pipeline(&api, &id).await?;
                Ok(state_readiness(pipeline.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "pipeline", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_round_trip() {
        let config = json!({
            "name": "cluster-logs",
            "location": "de/txl",
            "log": [{
                "source": "kubernetes",
                "tag": "prod",
                "protocol": "http",
                "destination": [{"type": "loki", "retention_in_days": 30}]
            }]
        });

        let wire =
            serde_json::to_value(Envelope::for_create(pipeline_from_config(&config))).unwrap();
        assert_eq!(wire["properties"]["logs"][0]["destinations"][0]["type"], "loki");

        let echoed: Envelope<PipelineProperties> = serde_json::from_value(json!({
            "id": "pl-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": wire["properties"]
        }))
        .unwrap();

        let state = pipeline_to_state(&echoed, &config);
        assert_eq!(state["name"], "cluster-logs");
        assert_eq!(state["log"][0]["source"], "kubernetes");
        assert_eq!(state["log"][0]["destination"][0]["retention_in_days"], 30);
    }

    #[test]
    fn test_pipeline_to_state_sets_computed_address() {
        let pipeline: Envelope<PipelineProperties> = serde_json::from_value(json!({
            "id": "pl-1",
            "properties": {"name": "cluster-logs", "tcpAddress": "pl-1.logging.ionos.com:9000"}
        }))
        .unwrap();

        let state = pipeline_to_state(&pipeline, &Value::Null);
        assert_eq!(state["tcp_address"], "pl-1.logging.ionos.com:9000");
        assert!(state.get("log").is_none());
    }
}
