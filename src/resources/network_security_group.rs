//! The `ionoscloud_network_security_group` resource.

use serde_json::Value;

use crate::api::compute::{
    self, SecurityGroup, SecurityGroupEntities, SecurityGroupProperties,
    SecurityGroupRuleProperties,
};
use crate::api::{Collection, Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct NetworkSecurityGroupResource;

#[async_trait::async_trait]
impl ResourceHandler for NetworkSecurityGroupResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_network_security_group"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "datacenter_id",
                Attribute::required(Kind::String).force_new(),
            )
            .attr("name", Attribute::required(Kind::String))
            .attr("description", Attribute::optional(Kind::String))
            .nested(
                "rule",
                NestedBlock::list(
                    Block::new()
                        .attr("protocol", Attribute::required(Kind::String))
                        .attr(
                            "direction",
                            Attribute::required(Kind::String)
                                .describe("INGRESS or EGRESS"),
                        )
                        .attr("name", Attribute::optional(Kind::String))
                        .attr("port_range_start", Attribute::optional(Kind::Int64))
                        .attr("port_range_end", Attribute::optional(Kind::Int64))
                        .attr("source_ip", Attribute::optional(Kind::String)),
                ),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&planned, "datacenter_id")?;
        let timeouts = Timeouts::from_config(&planned)?;

        let created =
            compute::create_security_group(api, &dc, &group_from_config(&planned)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal(
                    "security group create response carried no id".to_string(),
                )
            })?
            .to_string();

        wait_group_available(api, &dc, &id, timeouts.create).await?;

        let group = compute::get_security_group(api, &dc, &id).await?;
        Ok(group_to_state(&dc, &group, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;

        match compute::get_security_group(api, &dc, &id).await {
            Ok(group) => Ok(group_to_state(&dc, &group, &state)),
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

        // PUT replaces the whole group including its rule set
        compute::update_security_group(api, &dc, &id, &group_from_config(&planned)).await?;
        wait_group_available(api, &dc, &id, timeouts.update).await?;

        let group = compute::get_security_group(api, &dc, &id).await?;
        Ok(group_to_state(&dc, &group, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let dc = require_str(&state, "datacenter_id")?;
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        compute::delete_security_group(api, &dc, &id).await?;

        let probe = {
            let api = api.clone();
            let dc = dc.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let dc = dc.clone();
                let id = id.clone();
                async move {
                    match compute::get_security_group(&api, &dc, &id).await {
                        Ok(group) => Ok(Readiness::Pending(
                            group.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(
            WaitConfig::new(timeouts.delete),
            "security group deletion",
            probe,
        )
        .await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [dc, group_id] = import::parts::<2>(id, "datacenter_id/securitygroup_id")?;
        let group = compute::get_security_group(api, &dc, &group_id).await?;
        Ok(group_to_state(&dc, &group, &Value::Null))
    }
}

fn group_from_config(config: &Value) -> SecurityGroup {
    let rules: Vec<Envelope<SecurityGroupRuleProperties>> = config
        .get("rule")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .map(|rule| {
                    Envelope::for_create(SecurityGroupRuleProperties {
                        name: opt_str(rule, "name"),
                        protocol: opt_str(rule, "protocol"),
                        direction: opt_str(rule, "direction"),
                        port_range_start: opt_i64(rule, "port_range_start"),
                        port_range_end: opt_i64(rule, "port_range_end"),
                        source_ip: opt_str(rule, "source_ip"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SecurityGroup {
        properties: Some(SecurityGroupProperties {
            name: opt_str(config, "name"),
            description: opt_str(config, "description"),
        }),
        entities: (!rules.is_empty()).then_some(SecurityGroupEntities {
            rules: Some(Collection { items: rules }),
        }),
        ..Default::default()
    }
}

pub(crate) fn group_to_state(dc: &str, group: &SecurityGroup, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", group.id.clone());
    map.insert("datacenter_id".to_string(), dc.into());
    if let Some(props) = &group.properties {
        set_opt(&mut map, "name", props.name.clone());
        set_opt(&mut map, "description", props.description.clone());
    }
    if let Some(rules) = group.entities.as_ref().and_then(|e| e.rules.as_ref()) {
        let blocks: Vec<Value> = rules
            .items
            .iter()
            .map(|rule| {
                let mut rule_map = serde_json::Map::new();
                if let Some(props) = &rule.properties {
                    set_opt(&mut rule_map, "protocol", props.protocol.clone());
                    set_opt(&mut rule_map, "direction", props.direction.clone());
                    set_opt(&mut rule_map, "name", props.name.clone());
                    set_opt(&mut rule_map, "port_range_start", props.port_range_start);
                    set_opt(&mut rule_map, "port_range_end", props.port_range_end);
                    set_opt(&mut rule_map, "source_ip", props.source_ip.clone());
                }
                Value::Object(rule_map)
            })
            .collect();
        map.insert("rule".to_string(), blocks.into());
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_group_available(
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
                let group = compute::get_security_group(&api, &dc, &id).await?;
                Ok(state_readiness(group.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "security group", probe).await
}
