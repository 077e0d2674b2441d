//! DBaaS Postgres API: clusters.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// Postgres cluster properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<i64>,
    /// RAM in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<i64>,
    /// Storage in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// DNS name clients connect to, assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<ClusterConnection>>,
    /// Initial credentials; write-only, the API never returns them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ClusterCredentials>,
}

/// How a cluster attaches to a private LAN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
}

/// Initial database credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub async fn list_clusters(
    client: &IonosClient,
) -> Result<Collection<ClusterProperties>, ApiError> {
    client.get(client.pg_url("clusters")).await
}

pub async fn get_cluster(
    client: &IonosClient,
    id: &str,
) -> Result<Envelope<ClusterProperties>, ApiError> {
    client.get(client.pg_url(&format!("clusters/{}", id))).await
}

pub async fn create_cluster(
    client: &IonosClient,
    properties: ClusterProperties,
) -> Result<Envelope<ClusterProperties>, ApiError> {
    client
        .post(client.pg_url("clusters"), &Envelope::for_create(properties))
        .await
}

pub async fn update_cluster(
    client: &IonosClient,
    id: &str,
    properties: ClusterProperties,
) -> Result<Envelope<ClusterProperties>, ApiError> {
    client
        .patch(
            client.pg_url(&format!("clusters/{}", id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_cluster(client: &IonosClient, id: &str) -> Result<(), ApiError> {
    client.delete(client.pg_url(&format!("clusters/{}", id))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_wire_names() {
        let cluster: Envelope<ClusterProperties> = serde_json::from_value(json!({
            "id": "pg-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {
                "displayName": "orders-db",
                "postgresVersion": "15",
                "instances": 2,
                "cores": 4,
                "ram": 4096,
                "storageSize": 20480,
                "storageType": "SSD",
                "location": "de/fra",
                "dnsName": "pg-1.postgresql.de-fra.ionos.com",
                "connections": [{"datacenterId": "dc-1", "lanId": "3", "cidr": "10.1.1.0/24"}]
            }
        }))
        .unwrap();

        let props = cluster.properties.unwrap();
        assert_eq!(props.display_name.as_deref(), Some("orders-db"));
        assert_eq!(props.postgres_version.as_deref(), Some("15"));
        assert_eq!(props.storage_size, Some(20480));
        assert_eq!(
            props.dns_name.as_deref(),
            Some("pg-1.postgresql.de-fra.ionos.com")
        );
        let connection = &props.connections.unwrap()[0];
        assert_eq!(connection.datacenter_id.as_deref(), Some("dc-1"));
        assert_eq!(connection.lan_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_credentials_serialized_on_create_only() {
        let body = serde_json::to_value(Envelope::for_create(ClusterProperties {
            display_name: Some("orders-db".to_string()),
            credentials: Some(ClusterCredentials {
                username: Some("admin".to_string()),
                password: Some("s3cret".to_string()),
            }),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(body["properties"]["credentials"]["username"], "admin");
    }
}
