//! The `ionoscloud_vpn_wireguard_peer` resource.
//!
//! Peers live under a gateway; the import identifier carries the gateway's
//! location because peer lookups are regional: `location:gateway_id/peer_id`.

use serde_json::Value;

use crate::api::vpn::{self, PeerEndpoint, WireguardPeerProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, opt_str_list, require_str, set_opt, state_readiness,
    timeouts_block, ResourceHandler,
};

pub struct WireguardPeerResource;

#[async_trait::async_trait]
impl ResourceHandler for WireguardPeerResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_vpn_wireguard_peer"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr("gateway_id", Attribute::required(Kind::String).force_new())
            .attr("location", Attribute::optional(Kind::String).force_new())
            .attr("name", Attribute::required(Kind::String))
            .attr("description", Attribute::optional(Kind::String))
            .attr(
                "allowed_ips",
                Attribute::required(Kind::list(Kind::String)),
            )
            .attr("public_key", Attribute::required(Kind::String))
            .nested(
                "endpoint",
                NestedBlock::single(
                    Block::new()
                        .attr("host", Attribute::required(Kind::String))
                        .attr(
                            "port",
                            Attribute::optional(Kind::Int64)
                                .with_default(serde_json::json!(51820)),
                        ),
                ),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let gateway = require_str(&planned, "gateway_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created = vpn::create_peer(api, &gateway, peer_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("peer create response carried no id".to_string())
            })?
            .to_string();

        wait_peer_available(api, &gateway, &id, timeouts.create).await?;

        let peer = vpn::get_peer(api, &gateway, &id).await?;
        Ok(peer_to_state(&gateway, &peer, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let gateway = require_str(&state, "gateway_id")?;
        let id = require_str(&state, "id")?;

        match vpn::get_peer(api, &gateway, &id).await {
            Ok(peer) => Ok(peer_to_state(&gateway, &peer, &state)),
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
        let gateway = require_str(&planned, "gateway_id")?;
        let id = require_str(&prior, "id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        vpn::update_peer(api, &gateway, &id, peer_from_config(&planned)).await?;
        wait_peer_available(api, &gateway, &id, timeouts.update).await?;

        let peer = vpn::get_peer(api, &gateway, &id).await?;
        Ok(peer_to_state(&gateway, &peer, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let gateway = require_str(&state, "gateway_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        vpn::delete_peer(api, &gateway, &id).await?;

        let probe = {
            let api = api.clone();
            let gateway = gateway.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let gateway = gateway.clone();
                let id = id.clone();
                async move {
                    match vpn::get_peer(&api, &gateway, &id).await {
                        Ok(peer) => Ok(Readiness::Pending(
                            peer.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "peer deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let (location, rest) = import::location_scoped(id, "location:gateway_id/peer_id")?;
        let [gateway, peer_id] = import::parts::<2>(rest, "location:gateway_id/peer_id")?;

        let peer = vpn::get_peer(api, &gateway, &peer_id).await?;
        let mut state = peer_to_state(&gateway, &peer, &Value::Null);
        if let Value::Object(map) = &mut state {
            map.insert("location".to_string(), location.into());
        }
        Ok(state)
    }
}

fn peer_from_config(config: &Value) -> WireguardPeerProperties {
    let endpoint = config
        .get("endpoint")
        .filter(|v| !v.is_null())
        .map(|block| PeerEndpoint {
            host: opt_str(block, "host"),
            port: opt_i64(block, "port"),
        });

    WireguardPeerProperties {
        name: opt_str(config, "name"),
        description: opt_str(config, "description"),
        endpoint,
        allowed_ips: opt_str_list(config, "allowed_ips"),
        public_key: opt_str(config, "public_key"),
    }
}

pub(crate) fn peer_to_state(
    gateway: &str,
    peer: &Envelope<WireguardPeerProperties>,
    config: &Value,
) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", peer.id.clone());
    map.insert("gateway_id".to_string(), gateway.into());
    if let Some(props) = &peer.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "description", props.description.clone());
        set_opt(&mut map, "allowed_ips", props.allowed_ips.clone());
        set_opt(&mut map, "public_key", props.public_key.clone());
        if let Some(endpoint) = &props.endpoint {
            let mut endpoint_map = serde_json::Map::new();
            set_opt(&mut endpoint_map, "host", endpoint.host.clone());
            set_opt(&mut endpoint_map, "port", endpoint.port);
            map.insert("endpoint".to_string(), Value::Object(endpoint_map));
        }
    }
    set_opt(
        &mut map,
        "location",
        config.get("location").and_then(Value::as_str),
    );
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_peer_available(
    api: &IonosClient,
    gateway: &str,
    id: &str,
    deadline: std::time::Duration,
) -> Result<(), ProviderError> {
    let probe = {
        let api = api.clone();
        let gateway = gateway.to_string();
        let id = id.to_string();
        move || {
            let api = api.clone();
            let gateway = gateway.clone();
            let id = id.clone();
            async move {
                let peer = vpn::get_peer(&api, &gateway, &id).await?;
                Ok(state_readiness(peer.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "wireguard peer", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_peer_round_trip() {
        let config = json!({
            "gateway_id": "gw-1",
            "name": "laptop",
            "allowed_ips": ["10.7.222.5/32"],
            "public_key": "peerkey=",
            "endpoint": {"host": "1.2.3.4", "port": 51820}
        });

        let wire = serde_json::to_value(Envelope::for_create(peer_from_config(&config))).unwrap();
        assert_eq!(wire["properties"]["allowedIPs"][0], "10.7.222.5/32");

        let echoed: Envelope<WireguardPeerProperties> = serde_json::from_value(json!({
            "id": "peer-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": wire["properties"]
        }))
        .unwrap();

        let state = peer_to_state("gw-1", &echoed, &config);
        assert_eq!(state["name"], "laptop");
        assert_eq!(state["allowed_ips"][0], "10.7.222.5/32");
        assert_eq!(state["endpoint"]["host"], "1.2.3.4");
        assert_eq!(state["endpoint"]["port"], 51820);
    }

    #[test]
    fn test_peer_without_endpoint() {
        let config = json!({
            "gateway_id": "gw-1",
            "name": "roaming",
            "allowed_ips": ["10.7.222.6/32"],
            "public_key": "peerkey="
        });

        let properties = peer_from_config(&config);
        assert!(properties.endpoint.is_none());

        let peer: Envelope<WireguardPeerProperties> = serde_json::from_value(json!({
            "id": "peer-2",
            "properties": {"name": "roaming", "allowedIPs": ["10.7.222.6/32"]}
        }))
        .unwrap();
        let state = peer_to_state("gw-1", &peer, &config);
        assert!(state.get("endpoint").is_none());
    }
}
