//! Logging Service API: pipelines.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// Logging pipeline properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The log streams fed into this pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<PipelineLog>>,
    /// Endpoint logs are shipped to, assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_address: Option<String>,
}

/// One log stream within a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineLog {
    /// kubernetes / docker / systemd / generic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// http or tcp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinations: Option<Vec<LogDestination>>,
}

/// Where a log stream is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDestination {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub destination_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<i64>,
}

pub async fn list_pipelines(
    client: &IonosClient,
) -> Result<Collection<PipelineProperties>, ApiError> {
    client.get(client.logs_url("pipelines")).await
}

pub async fn get_pipeline(
    client: &IonosClient,
    id: &str,
) -> Result<Envelope<PipelineProperties>, ApiError> {
    client
        .get(client.logs_url(&format!("pipelines/{}", id)))
        .await
}

pub async fn create_pipeline(
    client: &IonosClient,
    properties: PipelineProperties,
) -> Result<Envelope<PipelineProperties>, ApiError> {
    client
        .post(client.logs_url("pipelines"), &Envelope::for_create(properties))
        .await
}

pub async fn update_pipeline(
    client: &IonosClient,
    id: &str,
    properties: PipelineProperties,
) -> Result<Envelope<PipelineProperties>, ApiError> {
    client
        .patch(
            client.logs_url(&format!("pipelines/{}", id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_pipeline(client: &IonosClient, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.logs_url(&format!("pipelines/{}", id)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_wire_names() {
        let pipeline: Envelope<PipelineProperties> = serde_json::from_value(json!({
            "id": "pl-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {
                "name": "cluster-logs",
                "location": "de/txl",
                "tcpAddress": "pl-1.logging.de-txl.ionos.com:9000",
                "logs": [{
                    "source": "kubernetes",
                    "tag": "prod",
                    "protocol": "http",
                    "destinations": [{"type": "loki", "retentionInDays": 30}]
                }]
            }
        }))
        .unwrap();

        let props = pipeline.properties.unwrap();
        assert_eq!(props.tcp_address.as_deref(), Some("pl-1.logging.de-txl.ionos.com:9000"));
        let log = &props.logs.unwrap()[0];
        assert_eq!(log.source.as_deref(), Some("kubernetes"));
        let destination = &log.destinations.as_ref().unwrap()[0];
        assert_eq!(destination.destination_type.as_deref(), Some("loki"));
        assert_eq!(destination.retention_in_days, Some(30));
    }
}
