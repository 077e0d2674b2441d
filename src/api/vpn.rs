//! VPN Gateway API: WireGuard gateways and peers.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// WireGuard gateway properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardGatewayProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Public IP the gateway listens on.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "gatewayIP")]
    pub gateway_ip: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "interfaceIPv4CIDR"
    )]
    pub interface_ipv4_cidr: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "interfaceIPv6CIDR"
    )]
    pub interface_ipv6_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<i64>,
    /// Write-only; the API never returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Derived by the service from the private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// WireGuard peer properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardPeerProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<PeerEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "allowedIPs")]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// The remote endpoint of a peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

// =============================================================================
// Gateways
// =============================================================================

pub async fn list_gateways(
    client: &IonosClient,
) -> Result<Collection<WireguardGatewayProperties>, ApiError> {
    client.get(client.vpn_url("wireguardgateways")).await
}

pub async fn get_gateway(
    client: &IonosClient,
    id: &str,
) -> Result<Envelope<WireguardGatewayProperties>, ApiError> {
    client
        .get(client.vpn_url(&format!("wireguardgateways/{}", id)))
        .await
}

pub async fn create_gateway(
    client: &IonosClient,
    properties: WireguardGatewayProperties,
) -> Result<Envelope<WireguardGatewayProperties>, ApiError> {
    client
        .post(
            client.vpn_url("wireguardgateways"),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn update_gateway(
    client: &IonosClient,
    id: &str,
    properties: WireguardGatewayProperties,
) -> Result<Envelope<WireguardGatewayProperties>, ApiError> {
    client
        .put(
            client.vpn_url(&format!("wireguardgateways/{}", id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_gateway(client: &IonosClient, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.vpn_url(&format!("wireguardgateways/{}", id)))
        .await
}

// =============================================================================
// Peers
// =============================================================================

pub async fn list_peers(
    client: &IonosClient,
    gateway: &str,
) -> Result<Collection<WireguardPeerProperties>, ApiError> {
    client
        .get(client.vpn_url(&format!("wireguardgateways/{}/peers", gateway)))
        .await
}

pub async fn get_peer(
    client: &IonosClient,
    gateway: &str,
    id: &str,
) -> Result<Envelope<WireguardPeerProperties>, ApiError> {
    client
        .get(client.vpn_url(&format!("wireguardgateways/{}/peers/{}", gateway, id)))
        .await
}

pub async fn create_peer(
    client: &IonosClient,
    gateway: &str,
    properties: WireguardPeerProperties,
) -> Result<Envelope<WireguardPeerProperties>, ApiError> {
    client
        .post(
            client.vpn_url(&format!("wireguardgateways/{}/peers", gateway)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn update_peer(
    client: &IonosClient,
    gateway: &str,
    id: &str,
    properties: WireguardPeerProperties,
) -> Result<Envelope<WireguardPeerProperties>, ApiError> {
    client
        .put(
            client.vpn_url(&format!("wireguardgateways/{}/peers/{}", gateway, id)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn delete_peer(client: &IonosClient, gateway: &str, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.vpn_url(&format!("wireguardgateways/{}/peers/{}", gateway, id)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_wire_names() {
        let gateway: Envelope<WireguardGatewayProperties> = serde_json::from_value(json!({
            "id": "gw-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {
                "name": "branch-gw",
                "gatewayIP": "81.173.1.2",
                "interfaceIPv4CIDR": "10.7.222.0/24",
                "listenPort": 51820,
                "publicKey": "nl8DxzpvvW0/9AN7fZGF0ZXZhbHVlCg=="
            }
        }))
        .unwrap();

        let props = gateway.properties.unwrap();
        assert_eq!(props.gateway_ip.as_deref(), Some("81.173.1.2"));
        assert_eq!(props.interface_ipv4_cidr.as_deref(), Some("10.7.222.0/24"));
        assert_eq!(props.listen_port, Some(51820));
        assert!(props.private_key.is_none());
    }

    #[test]
    fn test_peer_wire_names() {
        let body = serde_json::to_value(Envelope::for_create(WireguardPeerProperties {
            name: Some("laptop".to_string()),
            endpoint: Some(PeerEndpoint {
                host: Some("1.2.3.4".to_string()),
                port: Some(51820),
            }),
            allowed_ips: Some(vec!["10.7.222.5/32".to_string()]),
            public_key: Some("peerkey=".to_string()),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(body["properties"]["allowedIPs"][0], "10.7.222.5/32");
        assert_eq!(body["properties"]["endpoint"]["host"], "1.2.3.4");
        assert_eq!(body["properties"]["publicKey"], "peerkey=");
    }
}
