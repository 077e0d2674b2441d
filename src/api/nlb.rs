//! Cloud API v6: network load balancers.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// Network load balancer properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkLoadBalancerProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the listening LAN (inbound).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener_lan: Option<i64>,
    /// Id of the balanced private target LAN (outbound).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lan: Option<i64>,
    /// Listening IPs of the balancer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
    /// Private IPs used for balancing on the target LAN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_private_ips: Option<Vec<String>>,
}

pub async fn list_network_loadbalancers(
    client: &IonosClient,
    dc: &str,
) -> Result<Collection<NetworkLoadBalancerProperties>, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/networkloadbalancers?depth=1", dc)))
        .await
}

pub async fn get_network_loadbalancer(
    client: &IonosClient,
    dc: &str,
    id: &str,
) -> Result<Envelope<NetworkLoadBalancerProperties>, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/networkloadbalancers/{}", dc, id)))
        .await
}

pub async fn create_network_loadbalancer(
    client: &IonosClient,
    dc: &str,
    properties: NetworkLoadBalancerProperties,
) -> Result<Envelope<NetworkLoadBalancerProperties>, ApiError> {
    client
        .post(
            client.cloud_url(&format!("datacenters/{}/networkloadbalancers", dc)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn update_network_loadbalancer(
    client: &IonosClient,
    dc: &str,
    id: &str,
    properties: &NetworkLoadBalancerProperties,
) -> Result<Envelope<NetworkLoadBalancerProperties>, ApiError> {
    client
        .patch(
            client.cloud_url(&format!("datacenters/{}/networkloadbalancers/{}", dc, id)),
            properties,
        )
        .await
}

pub async fn delete_network_loadbalancer(
    client: &IonosClient,
    dc: &str,
    id: &str,
) -> Result<(), ApiError> {
    client
        .delete(client.cloud_url(&format!("datacenters/{}/networkloadbalancers/{}", dc, id)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nlb_wire_names() {
        let envelope: Envelope<NetworkLoadBalancerProperties> = serde_json::from_value(json!({
            "id": "nlb-1",
            "metadata": {"state": "AVAILABLE"},
            "properties": {
                "name": "lb1",
                "listenerLan": 1,
                "targetLan": 2,
                "ips": ["1.2.3.4"],
                "lbPrivateIps": ["10.0.4.5/24"]
            }
        }))
        .unwrap();

        let props = envelope.properties.unwrap();
        assert_eq!(props.listener_lan, Some(1));
        assert_eq!(props.target_lan, Some(2));
        assert_eq!(props.ips.as_deref(), Some(&["1.2.3.4".to_string()][..]));
        assert_eq!(
            props.lb_private_ips.as_deref(),
            Some(&["10.0.4.5/24".to_string()][..])
        );
    }
}
