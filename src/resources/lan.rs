//! The `ionoscloud_lan` resource.

use serde_json::Value;

use crate::api::compute::{self, LanProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Kind, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_bool, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct LanResource;

#[async_trait::async_trait]
impl ResourceHandler for LanResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_lan"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "datacenter_id",
                Attribute::required(Kind::String).force_new(),
            )
            .attr("name", Attribute::optional(Kind::String))
            .attr(
                "public",
                Attribute::optional(Kind::Bool).with_default(serde_json::json!(false)),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&planned, "datacenter_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created = compute::create_lan(api, &dc, lan_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| ProviderError::Internal("lan create response carried no id".to_string()))?
            .to_string();

        wait_lan_available(api, &dc, &id, timeouts.create).await?;

        let lan = compute::get_lan(api, &dc, &id).await?;
        Ok(lan_to_state(&dc, &lan, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;

        match compute::get_lan(api, &dc, &id).await {
            Ok(lan) => Ok(lan_to_state(&dc, &lan, &state)),
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
        let dc = require_str(&planned, "datacenter_id")?;
        let id = require_str(&prior, "id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        compute::update_lan(api, &dc, &id, &lan_from_config(&planned)).await?;
        wait_lan_available(api, &dc, &id, timeouts.update).await?;

        let lan = compute::get_lan(api, &dc, &id).await?;
        Ok(lan_to_state(&dc, &lan, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        compute::delete_lan(api, &dc, &id).await?;

        let probe = {
            let api = api.clone();
            let dc = dc.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let dc = dc.clone();
                let id = id.clone();
                async move {
                    match compute::get_lan(&api, &dc, &id).await {
                        Ok(lan) => Ok(Readiness::Pending(
                            lan.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "lan deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [dc, lan_id] = import::parts::<2>(id, "datacenter_id/lan_id")?;
        let lan = compute::get_lan(api, &dc, &lan_id).await?;
        Ok(lan_to_state(&dc, &lan, &Value::Null))
    }
}

fn lan_from_config(config: &Value) -> LanProperties {
    LanProperties {
        name: opt_str(config, "name"),
        public: opt_bool(config, "public"),
    }
}

pub(crate) fn lan_to_state(dc: &str, lan: &Envelope<LanProperties>, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", lan.id.clone());
    map.insert("datacenter_id".to_string(), dc.into());
    if let Some(props) = &lan.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "public", props.public);
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_lan_available(
    api: &IonosClient,
    dc: &str,
    id: &str,
    deadline: std::time::Duration,
) -> Result<(), ProviderError> {
    let probe = {
        let api = api.clone();
        let dc = dc.to_string();
        let id = id.to_string();
        move || {
            let api = api.clone();
            let dc = dc.clone();
            let id = id.clone();
            async move {
                let lan = compute::get_lan(&api, &dc, &id).await?;
                Ok(state_readiness(lan.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "lan", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lan_to_state() {
        let lan: Envelope<LanProperties> = serde_json::from_value(json!({
            "id": "lan-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {"name": "backbone", "public": false}
        }))
        .unwrap();

        let state = lan_to_state("dc-1", &lan, &Value::Null);
        assert_eq!(state["id"], "lan-1");
        assert_eq!(state["datacenter_id"], "dc-1");
        assert_eq!(state["name"], "backbone");
        assert_eq!(state["public"], false);
    }

    #[test]
    fn test_lan_to_state_guards_absent_properties() {
        let lan: Envelope<LanProperties> =
            serde_json::from_value(json!({"id": "lan-1"})).unwrap();

        let state = lan_to_state("dc-1", &lan, &Value::Null);
        assert_eq!(state["id"], "lan-1");
        assert!(state.get("name").is_none());
        assert!(state.get("public").is_none());
    }
}
