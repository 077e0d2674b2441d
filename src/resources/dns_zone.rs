//! The `ionoscloud_dns_zone` resource.

use serde_json::Value;

use crate::api::dns::{self, ZoneProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Kind, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_bool, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct DnsZoneResource;

#[async_trait::async_trait]
impl ResourceHandler for DnsZoneResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_dns_zone"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "name",
                Attribute::required(Kind::String)
                    .force_new()
                    .describe("the zone name, e.g. example.com"),
            )
            .attr("description", Attribute::optional(Kind::String))
            .attr(
                "enabled",
                Attribute::optional(Kind::Bool).with_default(serde_json::json!(true)),
            )
            .attr(
                "nameservers",
                Attribute::computed(Kind::list(Kind::String)),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let timeouts = Timeouts::from_config(&planned)?;

        let created = dns::create_zone(api, zone_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("zone create response carried no id".to_string())
            })?
            .to_string();

        wait_zone_available(api, &id, timeouts.create).await?;

        let zone = dns::get_zone(api, &id).await?;
        Ok(zone_to_state(&zone, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let id = require_str(&state, "id")?;

        match dns::get_zone(api, &id).await {
            Ok(zone) => Ok(zone_to_state(&zone, &state)),
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

        dns::update_zone(api, &id, zone_from_config(&planned)).await?;
        wait_zone_available(api, &id, timeouts.update).await?;

        let zone = dns::get_zone(api, &id).await?;
        Ok(zone_to_state(&zone, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        dns::delete_zone(api, &id).await?;

        let probe = {
            let api = api.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let id = id.clone();
                async move {
                    match dns::get_zone(&api, &id).await {
                        Ok(zone) => Ok(Readiness::Pending(
                            zone.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "zone deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [zone_id] = import::parts::<1>(id, "zone_id")?;
        let zone = dns::get_zone(api, &zone_id).await?;
        Ok(zone_to_state(&zone, &Value::Null))
    }
}

fn zone_from_config(config: &Value) -> ZoneProperties {
    ZoneProperties {
        zone_name: opt_str(config, "name"),
        description: opt_str(config, "description"),
        enabled: opt_bool(config, "enabled"),
    }
}

pub(crate) fn zone_to_state(zone: &Envelope<ZoneProperties>, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", zone.id.clone());
    if let Some(props) = &zone.properties {
        set_opt(&mut map, "name", props.zone_name.clone());
        set_opt(&mut map, "description", props.description.clone());
        set_opt(&mut map, "enabled", props.enabled);
    }
    // nameservers live in metadata, not properties
    set_opt(
        &mut map,
        "nameservers",
        zone.metadata.as_ref().and_then(|m| m.nameservers.clone()),
    );
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_zone_available(
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
                let zone = dns::get_zone(&api, &id).await?;
                Ok(state_readiness(zone.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "zone", probe).await
}
