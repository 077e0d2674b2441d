//! The `ionoscloud_vpn_wireguard_gateway` resource.
//!
//! The private key is write-only: it is sent on create and kept from the
//! configured state on refresh, since the API never returns it.

use serde_json::Value;

use crate::api::vpn::{self, WireguardGatewayProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Kind, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct WireguardGatewayResource;

#[async_trait::async_trait]
impl ResourceHandler for WireguardGatewayResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_vpn_wireguard_gateway"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr("name", Attribute::required(Kind::String))
            .attr("description", Attribute::optional(Kind::String))
            .attr("location", Attribute::optional(Kind::String).force_new())
            .attr("gateway_ip", Attribute::required(Kind::String))
            .attr(
                "interface_ipv4_cidr",
                Attribute::optional(Kind::String),
            )
            .attr(
                "interface_ipv6_cidr",
                Attribute::optional(Kind::String),
            )
            .attr(
                "listen_port",
                Attribute::optional(Kind::Int64).with_default(serde_json::json!(51820)),
            )
            .attr(
                "private_key",
                Attribute::required(Kind::String).sensitive(),
            )
            .attr("public_key", Attribute::computed(Kind::String))
            .attr("status", Attribute::computed(Kind::String))
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let timeouts = Timeouts::from_config(&planned)?;

        let created = vpn::create_gateway(api, gateway_from_config(&planned, true)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("gateway create response carried no id".to_string())
            })?
            .to_string();

        wait_gateway_available(api, &id, timeouts.create).await?;

        let gateway = vpn::get_gateway(api, &id).await?;
        Ok(gateway_to_state(&gateway, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let id = require_str(&state, "id")?;

        match vpn::get_gateway(api, &id).await {
            Ok(gateway) => Ok(gateway_to_state(&gateway, &state)),
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

        // The key is only transmitted when the practitioner changed it
        let send_key = prior.get("private_key") != planned.get("private_key");
        vpn::update_gateway(api, &id, gateway_from_config(&planned, send_key)).await?;
        wait_gateway_available(api, &id, timeouts.update).await?;

        let gateway = vpn::get_gateway(api, &id).await?;
        Ok(gateway_to_state(&gateway, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        vpn::delete_gateway(api, &id).await?;

        let probe = {
            let api = api.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let id = id.clone();
                async move {
                    match vpn::get_gateway(&api, &id).await {
                        Ok(gateway) => Ok(Readiness::Pending(
                            gateway.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "gateway deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [gateway_id] = import::parts::<1>(id, "gateway_id")?;
        let gateway = vpn::get_gateway(api, &gateway_id).await?;
        Ok(gateway_to_state(&gateway, &Value::Null))
    }
}

fn gateway_from_config(config: &Value, send_key: bool) -> WireguardGatewayProperties {
    WireguardGatewayProperties {
        name: opt_str(config, "name"),
        description: opt_str(config, "description"),
        location: opt_str(config, "location"),
        gateway_ip: opt_str(config, "gateway_ip"),
        interface_ipv4_cidr: opt_str(config, "interface_ipv4_cidr"),
        interface_ipv6_cidr: opt_str(config, "interface_ipv6_cidr"),
        listen_port: opt_i64(config, "listen_port"),
        private_key: send_key.then(|| opt_str(config, "private_key")).flatten(),
        public_key: None,
    }
}

pub(crate) fn gateway_to_state(
    gateway: &Envelope<WireguardGatewayProperties>,
    config: &Value,
) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", gateway.id.clone());
    if let Some(props) = &gateway.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "description", props.description.clone());
        set_opt(&mut map, "location", props.location.clone());
        set_opt(&mut map, "gateway_ip", props.gateway_ip.clone());
        set_opt(&mut map, "interface_ipv4_cidr", props.interface_ipv4_cidr.clone());
        set_opt(&mut map, "interface_ipv6_cidr", props.interface_ipv6_cidr.clone());
        set_opt(&mut map, "listen_port", props.listen_port);
        set_opt(&mut map, "public_key", props.public_key.clone());
    }
    // never returned by the API; kept from the configured state
    set_opt(
        &mut map,
        "private_key",
        config.get("private_key").and_then(Value::as_str),
    );
    set_opt(
        &mut map,
        "status",
        gateway.state().map(str::to_string),
    );
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_gateway_available(
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
                let gateway = vpn::get_gateway(&api, &id).await?;
                Ok(state_readiness(gateway.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "wireguard gateway", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_key_kept_from_config_not_api() {
        let gateway: Envelope<WireguardGatewayProperties> = serde_json::from_value(json!({
            "id": "gw-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {
                "name": "branch-gw",
                "gatewayIP": "81.173.1.2",
                "publicKey": "pubkey="
            }
        }))
        .unwrap();

        let config = json!({"private_key": "privkey=", "name": "branch-gw"});
        let state = gateway_to_state(&gateway, &config);

        assert_eq!(state["private_key"], "privkey=");
        assert_eq!(state["public_key"], "pubkey=");
        assert_eq!(state["status"], "AVAILABLE");
    }

    #[test]
    fn test_key_not_sent_when_unchanged() {
        let config = json!({"name": "gw", "gateway_ip": "1.2.3.4", "private_key": "privkey="});

        let with_key = gateway_from_config(&config, true);
        assert_eq!(with_key.private_key.as_deref(), Some("privkey="));

        let without_key = gateway_from_config(&config, false);
        assert!(without_key.private_key.is_none());
    }
}
