//! The `ionoscloud_network_loadbalancer` resource.

use serde_json::Value;

use crate::api::nlb::{self, NetworkLoadBalancerProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Kind, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, opt_str_list, require_str, set_opt, state_readiness,
    timeouts_block, ResourceHandler,
};

pub struct NetworkLoadBalancerResource;

#[async_trait::async_trait]
impl ResourceHandler for NetworkLoadBalancerResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_network_loadbalancer"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "datacenter_id",
                Attribute::required(Kind::String).force_new(),
            )
            .attr("name", Attribute::required(Kind::String))
            .attr("listener_lan", Attribute::required(Kind::Int64))
            .attr("target_lan", Attribute::required(Kind::Int64))
            .attr("ips", Attribute::optional(Kind::list(Kind::String)))
            .attr(
                "lb_private_ips",
                Attribute::optional_computed(Kind::list(Kind::String)),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&planned, "datacenter_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created =
            nlb::create_network_loadbalancer(api, &dc, nlb_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal(
                    "network load balancer create response carried no id".to_string(),
                )
            })?
            .to_string();

        wait_nlb_available(api, &dc, &id, timeouts.create).await?;

        let balancer = nlb::get_network_loadbalancer(api, &dc, &id).await?;
        Ok(nlb_to_state(&dc, &balancer, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;

        match nlb::get_network_loadbalancer(api, &dc, &id).await {
            Ok(balancer) => Ok(nlb_to_state(&dc, &balancer, &state)),
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

        nlb::update_network_loadbalancer(api, &dc, &id, &nlb_from_config(&planned)).await?;
        wait_nlb_available(api, &dc, &id, timeouts.update).await?;

        let balancer = nlb::get_network_loadbalancer(api, &dc, &id).await?;
        Ok(nlb_to_state(&dc, &balancer, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        nlb::delete_network_loadbalancer(api, &dc, &id).await?;

        let probe = {
            let api = api.clone();
            let dc = dc.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let dc = dc.clone();
                let id = id.clone();
                async move {
                    match nlb::get_network_loadbalancer(&api, &dc, &id).await {
                        Ok(balancer) => Ok(Readiness::Pending(
                            balancer.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(
            WaitConfig::new(timeouts.delete),
            "network load balancer deletion",
            probe,
        )
        .await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [dc, nlb_id] = import::parts::<2>(id, "datacenter_id/networkloadbalancer_id")?;
        let balancer = nlb::get_network_loadbalancer(api, &dc, &nlb_id).await?;
        Ok(nlb_to_state(&dc, &balancer, &Value::Null))
    }
}

fn nlb_from_config(config: &Value) -> NetworkLoadBalancerProperties {
    NetworkLoadBalancerProperties {
        name: opt_str(config, "name"),
        listener_lan: opt_i64(config, "listener_lan"),
        target_lan: opt_i64(config, "target_lan"),
        ips: opt_str_list(config, "ips"),
        lb_private_ips: opt_str_list(config, "lb_private_ips"),
    }
}

pub(crate) fn nlb_to_state(
    dc: &str,
    balancer: &Envelope<NetworkLoadBalancerProperties>,
    config: &Value,
) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", balancer.id.clone());
    map.insert("datacenter_id".to_string(), dc.into());
    if let Some(props) = &balancer.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "listener_lan", props.listener_lan);
        set_opt(&mut map, "target_lan", props.target_lan);
        set_opt(&mut map, "ips", props.ips.clone());
        set_opt(&mut map, "lb_private_ips", props.lb_private_ips.clone());
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_nlb_available(
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
                let balancer = nlb::get_network_loadbalancer(&api, &dc, &id).await?;
                Ok(state_readiness(balancer.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "network load balancer", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nlb_config_round_trip() {
        // the configured values must come back unchanged after passing
        // through the wire model and the mapping function
        let config = json!({
            "datacenter_id": "dc-1",
            "name": "lb1",
            "listener_lan": 1,
            "target_lan": 2,
            "ips": ["1.2.3.4"]
        });

        let wire = serde_json::to_value(Envelope::for_create(nlb_from_config(&config))).unwrap();
        assert_eq!(wire["properties"]["listenerLan"], 1);
        assert_eq!(wire["properties"]["targetLan"], 2);

        let echoed: Envelope<NetworkLoadBalancerProperties> = serde_json::from_value(json!({
            "id": "nlb-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": wire["properties"]
        }))
        .unwrap();

        let state = nlb_to_state("dc-1", &echoed, &config);
        assert_eq!(state["name"], "lb1");
        assert_eq!(state["listener_lan"], 1);
        assert_eq!(state["target_lan"], 2);
        assert_eq!(state["ips"], json!(["1.2.3.4"]));
    }

    #[test]
    fn test_nlb_to_state_guards_absent_lists() {
        let balancer: Envelope<NetworkLoadBalancerProperties> = serde_json::from_value(json!({
            "id": "nlb-1",
            "properties": {"name": "lb1", "listenerLan": 1, "targetLan": 2}
        }))
        .unwrap();

        let state = nlb_to_state("dc-1", &balancer, &Value::Null);
        assert!(state.get("ips").is_none());
        assert!(state.get("lb_private_ips").is_none());
    }
}
