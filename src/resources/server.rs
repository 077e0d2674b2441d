//! The `ionoscloud_server` resource.
//!
//! Servers are created with their volumes and NICs (and NIC firewall rules)
//! in one composite request; reads pull the entities back at depth 2. The
//! VM state machine (RUNNING / SHUTOFF) is owned by the Cloud API and is
//! only reflected into the computed `vm_state` attribute.

use serde_json::Value;

use crate::api::compute::{
    self, FirewallRuleProperties, Nic, NicEntities, NicList, NicProperties, Server,
    ServerEntities, ServerProperties, VolumeProperties,
};
use crate::api::{Collection, Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_bool, opt_i64, opt_str, opt_str_list, require_str, set_opt,
    state_readiness, timeouts_block, ResourceHandler,
};

pub struct ServerResource;

#[async_trait::async_trait]
impl ResourceHandler for ServerResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_server"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "datacenter_id",
                Attribute::required(Kind::String).force_new(),
            )
            .attr("name", Attribute::required(Kind::String))
            .attr("cores", Attribute::required(Kind::Int64))
            .attr(
                "ram",
                Attribute::required(Kind::Int64).describe("RAM in MB, multiples of 256"),
            )
            .attr(
                "availability_zone",
                Attribute::optional(Kind::String).force_new(),
            )
            .attr(
                "cpu_family",
                Attribute::optional_computed(Kind::String).force_new(),
            )
            .attr("vm_state", Attribute::computed(Kind::String))
            .attr("boot_volume", Attribute::computed(Kind::String))
            .nested("volume", NestedBlock::list(volume_block()).force_new())
            .nested("nic", NestedBlock::list(nic_block()).force_new())
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&planned, "datacenter_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created = compute::create_server(api, &dc, &server_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("server create response carried no id".to_string())
            })?
            .to_string();

        wait_server_available(api, &dc, &id, timeouts.create).await?;

        let server = compute::get_server(api, &dc, &id).await?;
        Ok(server_to_state(&dc, &server, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;

        match compute::get_server(api, &dc, &id).await {
            Ok(server) => Ok(server_to_state(&dc, &server, &state)),
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

        let properties = ServerProperties {
            name: opt_str(&planned, "name"),
            cores: opt_i64(&planned, "cores"),
            ram: opt_i64(&planned, "ram"),
            cpu_family: opt_str(&planned, "cpu_family"),
            ..Default::default()
        };
        compute::update_server(api, &dc, &id, &properties).await?;

        wait_server_available(api, &dc, &id, timeouts.update).await?;

        let server = compute::get_server(api, &dc, &id).await?;
        Ok(server_to_state(&dc, &server, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        compute::delete_server(api, &dc, &id).await?;

        let probe = {
            let api = api.clone();
            let dc = dc.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let dc = dc.clone();
                let id = id.clone();
                async move {
                    match compute::get_server(&api, &dc, &id).await {
                        Ok(server) => Ok(Readiness::Pending(
                            server.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "server deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [dc, server_id] = import::parts::<2>(id, "datacenter_id/server_id")?;
        let server = compute::get_server(api, &dc, &server_id).await?;
        Ok(server_to_state(&dc, &server, &Value::Null))
    }
}

fn volume_block() -> Block {
    Block::new()
        .attr("name", Attribute::optional(Kind::String))
        .attr(
            "size",
            Attribute::required(Kind::Int64).describe("size in GB"),
        )
        .attr("disk_type", Attribute::required(Kind::String))
        .attr("licence_type", Attribute::optional(Kind::String))
        .attr("image", Attribute::optional(Kind::String))
        .attr(
            "image_password",
            Attribute::optional(Kind::String).sensitive(),
        )
        .attr("availability_zone", Attribute::optional(Kind::String))
        .attr("bus", Attribute::optional(Kind::String))
}

fn nic_block() -> Block {
    Block::new()
        .attr("lan", Attribute::required(Kind::Int64))
        .attr("name", Attribute::optional(Kind::String))
        .attr("dhcp", Attribute::optional(Kind::Bool))
        .attr("ips", Attribute::optional(Kind::list(Kind::String)))
        .attr("firewall_active", Attribute::optional(Kind::Bool))
        .nested(
            "firewall",
            NestedBlock::list(
                Block::new()
                    .attr("protocol", Attribute::required(Kind::String))
                    .attr("name", Attribute::optional(Kind::String))
                    .attr("source_ip", Attribute::optional(Kind::String))
                    .attr("port_range_start", Attribute::optional(Kind::Int64))
                    .attr("port_range_end", Attribute::optional(Kind::Int64)),
            ),
        )
}

async fn wait_server_available(
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
                let server = compute::get_server(&api, &dc, &id).await?;
                Ok(state_readiness(server.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "server", probe).await
}

/// Build the composite create request from the configured attribute map.
pub(crate) fn server_from_config(config: &Value) -> Server {
    let volumes: Vec<Envelope<VolumeProperties>> = config
        .get("volume")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().map(volume_from_config).collect())
        .unwrap_or_default();

    let nics: Vec<Nic> = config
        .get("nic")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().map(nic_from_config).collect())
        .unwrap_or_default();

    let entities = if volumes.is_empty() && nics.is_empty() {
        None
    } else {
        Some(ServerEntities {
            volumes: (!volumes.is_empty()).then_some(Collection { items: volumes }),
            nics: (!nics.is_empty()).then_some(NicList { items: nics }),
        })
    };

    Server {
        properties: Some(ServerProperties {
            name: opt_str(config, "name"),
            cores: opt_i64(config, "cores"),
            ram: opt_i64(config, "ram"),
            availability_zone: opt_str(config, "availability_zone"),
            cpu_family: opt_str(config, "cpu_family"),
            ..Default::default()
        }),
        entities,
        ..Default::default()
    }
}

fn volume_from_config(block: &Value) -> Envelope<VolumeProperties> {
    Envelope::for_create(VolumeProperties {
        name: opt_str(block, "name"),
        size: opt_i64(block, "size"),
        disk_type: opt_str(block, "disk_type"),
        licence_type: opt_str(block, "licence_type"),
        image: opt_str(block, "image"),
        image_password: opt_str(block, "image_password"),
        availability_zone: opt_str(block, "availability_zone"),
        bus: opt_str(block, "bus"),
    })
}

fn nic_from_config(block: &Value) -> Nic {
    let firewall: Vec<Envelope<FirewallRuleProperties>> = block
        .get("firewall")
        .and_then(Value::as_array)
        .map(|rules| {
            rules
                .iter()
                .map(|rule| {
                    Envelope::for_create(FirewallRuleProperties {
                        name: opt_str(rule, "name"),
                        protocol: opt_str(rule, "protocol"),
                        source_ip: opt_str(rule, "source_ip"),
                        port_range_start: opt_i64(rule, "port_range_start"),
                        port_range_end: opt_i64(rule, "port_range_end"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Nic {
        properties: Some(NicProperties {
            name: opt_str(block, "name"),
            lan: opt_i64(block, "lan"),
            dhcp: opt_bool(block, "dhcp"),
            ips: opt_str_list(block, "ips"),
            firewall_active: opt_bool(block, "firewall_active"),
        }),
        entities: (!firewall.is_empty()).then_some(NicEntities {
            firewallrules: Some(Collection { items: firewall }),
        }),
        ..Default::default()
    }
}

/// Map an API server onto the attribute map, guarding every optional field.
pub(crate) fn server_to_state(dc: &str, server: &Server, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", server.id.clone());
    map.insert("datacenter_id".to_string(), dc.into());

    if let Some(props) = &server.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "cores", props.cores);
        set_opt(&mut map, "ram", props.ram);
        set_opt(&mut map, "availability_zone", props.availability_zone.clone());
        set_opt(&mut map, "cpu_family", props.cpu_family.clone());
        set_opt(&mut map, "vm_state", props.vm_state.clone());
        // boot_volume is set only when the API reports one
        set_opt(
            &mut map,
            "boot_volume",
            props.boot_volume.as_ref().map(|r| r.id.clone()),
        );
    }

    if let Some(entities) = &server.entities {
        if let Some(volumes) = &entities.volumes {
            let blocks: Vec<Value> = volumes.items.iter().map(volume_to_block).collect();
            map.insert("volume".to_string(), blocks.into());
        }
        if let Some(nics) = &entities.nics {
            let blocks: Vec<Value> = nics.items.iter().map(nic_to_block).collect();
            map.insert("nic".to_string(), blocks.into());
        }
    }

    carry_timeouts(&mut map, config);
    Value::Object(map)
}

fn volume_to_block(volume: &Envelope<VolumeProperties>) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(props) = &volume.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "size", props.size);
        set_opt(&mut map, "disk_type", props.disk_type.clone());
        set_opt(&mut map, "licence_type", props.licence_type.clone());
        set_opt(&mut map, "image", props.image.clone());
        set_opt(&mut map, "availability_zone", props.availability_zone.clone());
        set_opt(&mut map, "bus", props.bus.clone());
    }
    Value::Object(map)
}

fn nic_to_block(nic: &Nic) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(props) = &nic.properties {
        set_opt(&mut map, "lan", props.lan);
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "dhcp", props.dhcp);
        set_opt(&mut map, "ips", props.ips.clone());
        set_opt(&mut map, "firewall_active", props.firewall_active);
    }
    if let Some(rules) = nic
        .entities
        .as_ref()
        .and_then(|e| e.firewallrules.as_ref())
    {
        let blocks: Vec<Value> = rules
            .items
            .iter()
            .map(|rule| {
                let mut rule_map = serde_json::Map::new();
                if let Some(props) = &rule.properties {
                    set_opt(&mut rule_map, "protocol", props.protocol.clone());
                    set_opt(&mut rule_map, "name", props.name.clone());
                    set_opt(&mut rule_map, "source_ip", props.source_ip.clone());
                    set_opt(&mut rule_map, "port_range_start", props.port_range_start);
                    set_opt(&mut rule_map, "port_range_end", props.port_range_end);
                }
                Value::Object(rule_map)
            })
            .collect();
        map.insert("firewall".to_string(), blocks.into());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Metadata, ResourceRef};
    use serde_json::json;

    fn api_server(boot_volume: Option<&str>) -> Server {
        Server {
            id: Some("srv-1".to_string()),
            metadata: Some(Metadata {
                state: Some("AVAILABLE".to_string()),
                created_date: None,
                nameservers: None,
            }),
            properties: Some(ServerProperties {
                name: Some("web-1".to_string()),
                cores: Some(2),
                ram: Some(2048),
                vm_state: Some("RUNNING".to_string()),
                boot_volume: boot_volume.map(|id| ResourceRef { id: id.to_string() }),
                ..Default::default()
            }),
            entities: None,
        }
    }

    #[test]
    fn test_boot_volume_set_when_api_reports_one() {
        let state = server_to_state("dc-1", &api_server(Some("vol-1")), &Value::Null);
        assert_eq!(state["boot_volume"], "vol-1");
    }

    #[test]
    fn test_boot_volume_unset_when_api_reports_none() {
        let state = server_to_state("dc-1", &api_server(None), &Value::Null);
        assert!(state.get("boot_volume").is_none());
        // the rest of the mapping is unaffected
        assert_eq!(state["id"], "srv-1");
        assert_eq!(state["vm_state"], "RUNNING");
    }

    #[test]
    fn test_server_from_config_builds_composite_request() {
        let config = json!({
            "datacenter_id": "dc-1",
            "name": "web-1",
            "cores": 2,
            "ram": 2048,
            "volume": [{"size": 50, "disk_type": "SSD", "image_password": "s3cret"}],
            "nic": [{
                "lan": 1,
                "dhcp": true,
                "firewall_active": true,
                "firewall": [{"protocol": "TCP", "port_range_start": 22, "port_range_end": 22}]
            }]
        });

        let server = server_from_config(&config);
        let body = serde_json::to_value(&server).unwrap();

        assert_eq!(body["properties"]["name"], "web-1");
        assert_eq!(body["entities"]["volumes"]["items"][0]["properties"]["type"], "SSD");
        assert_eq!(
            body["entities"]["volumes"]["items"][0]["properties"]["imagePassword"],
            "s3cret"
        );
        assert_eq!(body["entities"]["nics"]["items"][0]["properties"]["lan"], 1);
        assert_eq!(
            body["entities"]["nics"]["items"][0]["entities"]["firewallrules"]["items"][0]
                ["properties"]["portRangeStart"],
            22
        );
    }

    #[test]
    fn test_server_from_config_without_blocks_has_no_entities() {
        let config = json!({"name": "bare", "cores": 1, "ram": 1024});
        let server = server_from_config(&config);
        assert!(server.entities.is_none());
    }

    #[test]
    fn test_round_trip_preserves_nested_blocks() {
        let wire: Server = serde_json::from_value(json!({
            "id": "srv-1",
            "properties": {"name": "web-1", "cores": 2, "ram": 2048},
            "entities": {
                "volumes": {"items": [{"properties": {"name": "system", "size": 50, "type": "SSD"}}]},
                "nics": {"items": [{
                    "properties": {"lan": 1, "ips": ["10.0.0.5"]},
                    "entities": {"firewallrules": {"items": [{"properties": {"protocol": "TCP"}}]}}
                }]}
            }
        }))
        .unwrap();

        let state = server_to_state("dc-1", &wire, &Value::Null);
        assert_eq!(state["volume"][0]["disk_type"], "SSD");
        assert_eq!(state["volume"][0]["size"], 50);
        assert_eq!(state["nic"][0]["lan"], 1);
        assert_eq!(state["nic"][0]["ips"][0], "10.0.0.5");
        assert_eq!(state["nic"][0]["firewall"][0]["protocol"], "TCP");
    }

    #[test]
    fn test_state_carries_timeouts_from_config() {
        let config = json!({"timeouts": {"create": "10m"}});
        let state = server_to_state("dc-1", &api_server(None), &config);
        assert_eq!(state["timeouts"]["create"], "10m");
    }

    #[test]
    fn test_schema_marks_replacement_triggers() {
        let schema = ServerResource.schema();
        assert!(schema.block.attributes["datacenter_id"].force_new);
        assert!(schema.block.blocks["volume"].force_new);
        assert!(schema.block.blocks["nic"].force_new);
        assert!(!schema.block.attributes["name"].force_new);
    }
}
