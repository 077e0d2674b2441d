//! The `ionoscloud_dns_record` resource.

use serde_json::Value;

use crate::api::dns::{self, RecordProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Kind, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_bool, opt_i64, opt_str, require_str, set_opt, state_readiness,
    timeouts_block, ResourceHandler,
};

pub struct DnsRecordResource;

#[async_trait::async_trait]
impl ResourceHandler for DnsRecordResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_dns_record"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr("zone_id", Attribute::required(Kind::String).force_new())
            .attr("name", Attribute::required(Kind::String))
            .attr(
                "type",
                Attribute::required(Kind::String)
                    .force_new()
                    .describe("A, AAAA, CNAME, MX, TXT, ..."),
            )
            .attr("content", Attribute::required(Kind::String))
            .attr(
                "ttl",
                Attribute::optional(Kind::Int64).with_default(serde_json::json!(3600)),
            )
            .attr(
                "priority",
                Attribute::optional(Kind::Int64).describe("MX and SRV records only"),
            )
            .attr(
                "enabled",
                Attribute::optional(Kind::Bool).with_default(serde_json::json!(true)),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let zone = require_str(&planned, "zone_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created = dns::create_record(api, &zone, record_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("record create response carried no id".to_string())
            })?
            .to_string();

        wait_record_available(api, &zone, &id, timeouts.create).await?;

        let record = dns::get_record(api, &zone, &id).await?;
        Ok(record_to_state(&zone, &record, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let zone = require_str(&state, "zone_id")?;
        let id = require_str(&state, "id")?;

        match dns::get_record(api, &zone, &id).await {
            Ok(record) => Ok(record_to_state(&zone, &record, &state)),
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
        let zone = require_str(&planned, "zone_id")?;
        let id = require_str(&prior, "id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        dns::update_record(api, &zone, &id, record_from_config(&planned)).await?;
        wait_record_available(api, &zone, &id, timeouts.update).await?;

        let record = dns::get_record(api, &zone, &id).await?;
        Ok(record_to_state(&zone, &record, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let zone = require_str(&state, "zone_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        dns::delete_record(api, &zone, &id).await?;

        let probe = {
            let api = api.clone();
            let zone = zone.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let zone = zone.clone();
                let id = id.clone();
                async move {
                    match dns::get_record(&api, &zone, &id).await {
                        Ok(record) => Ok(Readiness::Pending(
                            record.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "record deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [zone, record_id] = import::parts::<2>(id, "zone_id/record_id")?;
        let record = dns::get_record(api, &zone, &record_id).await?;
        Ok(record_to_state(&zone, &record, &Value::Null))
    }
}

fn record_from_config(config: &Value) -> RecordProperties {
    RecordProperties {
        name: opt_str(config, "name"),
        record_type: opt_str(config, "type"),
        content: opt_str(config, "content"),
        ttl: opt_i64(config, "ttl"),
        priority: opt_i64(config, "priority"),
        enabled: opt_bool(config, "enabled"),
    }
}

pub(crate) fn record_to_state(
    zone: &str,
    record: &Envelope<RecordProperties>,
    config: &Value,
) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", record.id.clone());
    map.insert("zone_id".to_string(), zone.into());
    if let Some(props) = &record.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "type", props.record_type.clone());
        set_opt(&mut map, "content", props.content.clone());
        set_opt(&mut map, "ttl", props.ttl);
        set_opt(&mut map, "priority", props.priority);
        set_opt(&mut map, "enabled", props.enabled);
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_record_available(
    api: &IonosClient,
    zone: &str,
    id: &str,
    deadline: std::time::Duration,
) -> Result<(), ProviderError> {
    let probe = {
        let api = api.clone();
        let zone = zone.to_string();
        let id = id.to_string();
        move || {
            let api = api.clone();
            let zone = zone.clone();
            let id = id.clone();
            async move {
                let record = dns::get_record(&api, &zone, &id).await?;
                Ok(state_readiness(record.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "record", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_round_trip() {
        let config = json!({
            "zone_id": "zone-1",
            "name": "mail",
            "type": "MX",
            "content": "mx1.example.com",
            "ttl": 300,
            "priority": 10
        });

        let wire =
            serde_json::to_value(Envelope::for_create(record_from_config(&config))).unwrap();
        assert_eq!(wire["properties"]["type"], "MX");

        let echoed: Envelope<RecordProperties> = serde_json::from_value(json!({
            "id": "rec-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": wire["properties"]
        }))
        .unwrap();

        let state = record_to_state("zone-1", &echoed, &config);
        assert_eq!(state["name"], "mail");
        assert_eq!(state["type"], "MX");
        assert_eq!(state["content"], "mx1.example.com");
        assert_eq!(state["ttl"], 300);
        assert_eq!(state["priority"], 10);
    }

    #[test]
    fn test_record_to_state_guards_priority() {
        let record: Envelope<RecordProperties> = serde_json::from_value(json!({
            "id": "rec-1",
            "properties": {"name": "www", "type": "A", "content": "1.2.3.4", "ttl": 3600}
        }))
        .unwrap();

        let state = record_to_state("zone-1", &record, &Value::Null);
        assert!(state.get("priority").is_none());
    }
}
