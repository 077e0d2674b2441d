//! The `ionoscloud_pg_cluster` resource.
//!
//! Initial credentials are write-only: sent on create, kept from the
//! configured state on refresh. Cluster sizing (instances, cores, ram,
//! storage) is updatable in place; version and location force replacement.

use serde_json::Value;

use crate::api::dbaas::{self, ClusterConnection, ClusterCredentials, ClusterProperties};
use crate::api::{Envelope, IonosClient};
use crate::error::ProviderError;
use crate::import;
use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
use crate::waiter::{wait_until, Readiness, Timeouts, WaitConfig};

use super::{
    carry_timeouts, opt_i64, opt_str, require_str, set_opt, state_readiness, timeouts_block,
    ResourceHandler,
};

pub struct PgClusterResource;

#[async_trait::async_trait]
impl ResourceHandler for PgClusterResource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_pg_cluster"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr("display_name", Attribute::required(Kind::String))
            .attr("postgres_version", Attribute::required(Kind::String).force_new())
            .attr("location", Attribute::required(Kind::String).force_new())
            .attr("instances", Attribute::required(Kind::Int64))
            .attr("cores", Attribute::required(Kind::Int64))
            .attr(
                "ram",
                Attribute::required(Kind::Int64).describe("RAM per instance in MB"),
            )
            .attr(
                "storage_size",
                Attribute::required(Kind::Int64).describe("storage per instance in MB"),
            )
            .attr("storage_type", Attribute::optional(Kind::String).force_new())
            .attr("dns_name", Attribute::computed(Kind::String))
            .nested(
                "connection",
                NestedBlock::list(
                    Block::new()
                        .attr("datacenter_id", Attribute::required(Kind::String))
                        .attr("lan_id", Attribute::required(Kind::String))
                        .attr("cidr", Attribute::required(Kind::String)),
                )
                .at_most(1),
            )
            .nested(
                "credentials",
                NestedBlock::single(
                    Block::new()
                        .attr("username", Attribute::required(Kind::String))
                        .attr(
                            "password",
                            Attribute::required(Kind::String).sensitive(),
                        ),
                )
                .at_least(1)
                .force_new(),
            )
            .nested("timeouts", timeouts_block())
    }

    async fn create(&self, api: &IonosClient, planned: Value) -> Result<Value, ProviderError> {
        let timeouts = Timeouts::from_config(&planned)?;

        let created = dbaas::create_cluster(api, cluster_from_config(&planned, true)).await?;
        let id = created
            .id()
            .ok_or_else(|| {
                ProviderError::Internal("cluster create response carried no id".to_string())
            })?
            .to_string();

        wait_cluster_available(api, &id, timeouts.create).await?;

        let cluster = dbaas::get_cluster(api, &id).await?;
        Ok(cluster_to_state(&cluster, &planned))
    }

    async fn read(&self, api: &IonosClient, state: Value) -> Result<Value, ProviderError> {
        let id = require_str(&state, "id")?;

        match dbaas::get_cluster(api, &id).await {
            Ok(cluster) => Ok(cluster_to_state(&cluster, &state)),
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

        // credentials are immutable after create and never patched
        dbaas::update_cluster(api, &id, cluster_from_config(&planned, false)).await?;
        wait_cluster_available(api, &id, timeouts.update).await?;

        let cluster = dbaas::get_cluster(api, &id).await?;
        Ok(cluster_to_state(&cluster, &planned))
    }

    async fn delete(&self, api: &IonosClient, state: Value) -> Result<(), ProviderError> {
        let id = require_str(&state, "id")?;
        let timeouts = Timeouts::from_config(&state)?;

        dbaas::delete_cluster(api, &id).await?;

        let probe = {
            let api = api.clone();
            let id = id.clone();
            move || {
                let api = api.clone();
                let id = id.clone();
                async move {
                    match dbaas::get_cluster(&api, &id).await {
                        Ok(cluster) => Ok(Readiness::Pending(
                            cluster.state().unwrap_or("UNKNOWN").to_string(),
                        )),
                        Err(e) if e.is_not_found() => Ok(Readiness::Ready(())),
                        Err(e) => Err(e.into()),
                    }
                }
            }
        };
        wait_until(WaitConfig::new(timeouts.delete), "cluster deletion", probe).await
    }

    async fn import(&self, api: &IonosClient, id: &str) -> Result<Value, ProviderError> {
        let [cluster_id] = import::parts::<1>(id, "cluster_id")?;
        let cluster = dbaas::get_cluster(api, &cluster_id).await?;
        Ok(cluster_to_state(&cluster, &Value::Null))
    }
}

fn cluster_from_config(config: &Value, send_credentials: bool) -> ClusterProperties {
    let connections = config
        .get("connection")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .map(|block| ClusterConnection {
                    datacenter_id: opt_str(block, "datacenter_id"),
                    lan_id: opt_str(block, "lan_id"),
                    cidr: opt_str(block, "cidr"),
                })
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty());

    let credentials = if send_credentials {
        config
            .get("credentials")
            .filter(|v| !v.is_null())
            .map(|block| ClusterCredentials {
                username: opt_str(block, "username"),
                password: opt_str(block, "password"),
            })
    } else {
        None
    };

    ClusterProperties {
        display_name: opt_str(config, "display_name"),
        postgres_version: opt_str(config, "postgres_version"),
        instances: opt_i64(config, "instances"),
        cores: opt_i64(config, "cores"),
        ram: opt_i64(config, "ram"),
        storage_size: opt_i64(config, "storage_size"),
        storage_type: opt_str(config, "storage_type"),
        location: opt_str(config, "location"),
        connections,
        credentials,
        ..Default::default()
    }
}

pub(crate) fn cluster_to_state(cluster: &Envelope<ClusterProperties>, config: &Value) -> Value {
    let mut map = serde_json::Map::new();
    set_opt(&mut map, "id", cluster.id.clone());
    if let Some(props) = &cluster.properties {
        set_opt(&mut map, "display_name", props.display_name.clone());
        set_opt(&mut map, "postgres_version", props.postgres_version.clone());
        set_opt(&mut map, "location", props.location.clone());
        set_opt(&mut map, "instances", props.instances);
        set_opt(&mut map, "cores", props.cores);
        set_opt(&mut map, "ram", props.ram);
        set_opt(&mut map, "storage_size", props.storage_size);
        set_opt(&mut map, "storage_type", props.storage_type.clone());
        set_opt(&mut map, "dns_name", props.dns_name.clone());
        if let Some(connections) = &props.connections {
            let blocks: Vec<Value> = connections
                .iter()
                .map(|connection| {
                    let mut connection_map = serde_json::Map::new();
                    set_opt(
                        &mut connection_map,
                        "datacenter_id",
                        connection.datacenter_id.clone(),
                    );
                    set_opt(&mut connection_map, "lan_id", connection.lan_id.clone());
                    set_opt(&mut connection_map, "cidr", connection.cidr.clone());
                    Value::Object(connection_map)
                })
                .collect();
            map.insert("connection".to_string(), blocks.into());
        }
    }
    // write-only; the API never returns them
    if let Some(credentials) = config.get("credentials").filter(|v| !v.is_null()) {
        map.insert("credentials".to_string(), credentials.clone());
    }
    carry_timeouts(&mut map, config);
    Value::Object(map)
}

async fn wait_cluster_available(
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
                let cluster = dbaas::get_cluster(&api, &id).await?;
                Ok(state_readiness(cluster.state()))
            }
        }
    };
    wait_until(WaitConfig::new(deadline), "postgres cluster", probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Value {
        json!({
            "display_name": "orders-db",
            "postgres_version": "15",
            "location": "de/fra",
            "instances": 2,
            "cores": 4,
            "ram": 4096,
            "storage_size": 20480,
            "connection": [{"datacenter_id": "dc-1", "lan_id": "3", "cidr": "10.1.1.10/24"}],
            "credentials": {"username": "admin", "password": "s3cret"}
        })
    }

    #[test]
    fn test_credentials_sent_on_create_only() {
        let create = cluster_from_config(&config(), true);
        assert_eq!(
            create.credentials.as_ref().and_then(|c| c.username.as_deref()),
            Some("admin")
        );

        let update = cluster_from_config(&config(), false);
        assert!(update.credentials.is_none());
    }

    #[test]
    fn test_cluster_round_trip_keeps_credentials_from_config() {
        let wire = serde_json::to_value(Envelope::for_create(cluster_from_config(
            &config(),
            false,
        )))
        .unwrap();

        let echoed: Envelope<ClusterProperties> = serde_json::from_value(json!({
            "id": "pg-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": wire["properties"]
        }))
        .unwrap();

        let state = cluster_to_state(&echoed, &config());
        assert_eq!(state["display_name"], "orders-db");
        assert_eq!(state["connection"][0]["lan_id"], "3");
        // credentials come from configuration, not the API echo
        assert_eq!(state["credentials"]["username"], "admin");
    }

    #[test]
    fn test_cluster_state_guards_dns_name() {
        let cluster: Envelope<ClusterProperties> = serde_json::from_value(json!({
            "id": "pg-1",
            "properties": {"displayName": "orders-db"}
        }))
        .unwrap();

        let state = cluster_to_state(&cluster, &Value::Null);
        assert!(state.get("dns_name").is_none());
    }
}
