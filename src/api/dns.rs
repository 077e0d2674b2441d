//! Cloud DNS API: zones and records.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// DNS zone properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneProperties {
    /// The zone name, e.g. `example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// DNS record properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Record type: A, AAAA, CNAME, MX, TXT, ...
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Only meaningful for MX and SRV records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

// =============================================================================
// Zones
// =============================================================================

pub async fn list_zones(client: &IonosClient) -> Result<Collection<ZoneProperties>, ApiError> {
    client.get(client.dns_url("zones")).await
}

pub async fn get_zone(
    client: &IonosClient,
    id: &str,
) -> Result<Envelope<ZoneProperties>, ApiError> {
    client.get(client.dns_url(&format!("zones/{}", id))).await
}

pub async fn create_zone(
    client: &IonosClient,
    properties: ZoneProperties,
) -> Result<Envelope<ZoneProperties>, ApiError> {
    client
        .post(client.dns_url("zones"), &Envelope::for_create(properties))
        .await
}

pub async fn update_zone(
    client: &IonosClient,
    id: &str,
    properties: ZoneProperties,
) -> Result<Envelope<ZoneProperties>, ApiError> {
    client
        .put(
            client.dns_url(&format!("zones/{}", id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_zone(client: &IonosClient, id: &str) -> Result<(), ApiError> {
    client.delete(client.dns_url(&format!("zones/{}", id))).await
}

// =============================================================================
// Records
// =============================================================================

pub async fn list_records(
    client: &IonosClient,
    zone: &str,
) -> Result<Collection<RecordProperties>, ApiError> {
    client
        .get(client.dns_url(&format!("zones/{}/records", zone)))
        .await
}

pub async fn get_record(
    client: &IonosClient,
    zone: &str,
    id: &str,
) -> Result<Envelope<RecordProperties>, ApiError> {
    client
        .get(client.dns_url(&format!("zones/{}/records/{}", zone, id)))
        .await
}

pub async fn create_record(
    client: &IonosClient,
    zone: &str,
    properties: RecordProperties,
) -> Result<Envelope<RecordProperties>, ApiError> {
    client
        .post(
            client.dns_url(&format!("zones/{}/records", zone)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn update_record(
    client: &IonosClient,
    zone: &str,
    id: &str,
    properties: RecordProperties,
) -> Result<Envelope<RecordProperties>, ApiError> {
    client
        .put(
            client.dns_url(&format!("zones/{}/records/{}", zone, id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_record(client: &IonosClient, zone: &str, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.dns_url(&format!("zones/{}/records/{}", zone, id)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_type_wire_name() {
        let record: Envelope<RecordProperties> = serde_json::from_value(json!({
            "id": "rec-1",
            "properties": {"name": "www", "type": "A", "content": "1.2.3.4", "ttl": 3600}
        }))
        .unwrap();
        assert_eq!(
            record.properties.as_ref().unwrap().record_type.as_deref(),
            Some("A")
        );

        let body = serde_json::to_value(Envelope::for_create(RecordProperties {
            name: Some("www".to_string()),
            record_type: Some("A".to_string()),
            content: Some("1.2.3.4".to_string()),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(body["properties"]["type"], "A");
    }

    #[test]
    fn test_zone_nameservers_in_metadata() {
        let zone: Envelope<ZoneProperties> = serde_json::from_value(json!({
            "id": "zone-1",
            "metadata": {"state": "AVAILABLE", "nameservers": ["ns1.example.com", "ns2.example.com"]},
            "properties": {"zoneName": "example.com", "enabled": true}
        }))
        .unwrap();

        let nameservers = zone.metadata.as_ref().unwrap().nameservers.as_ref().unwrap();
        assert_eq!(nameservers.len(), 2);
        assert_eq!(
            zone.properties.as_ref().unwrap().zone_name.as_deref(),
            Some("example.com")
        );
    }
}
