//! Cloud API v6: datacenters' servers, LANs, and network security groups.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient, Metadata, ResourceRef};

/// Server properties as carried on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<i64>,
    /// RAM in MB, multiples of 256.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_family: Option<String>,
    /// RUNNING / SHUTOFF, owned by the VM state machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_volume: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_cdrom: Option<ResourceRef>,
}

/// Volume properties nested under a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in GB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub disk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licence_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus: Option<String>,
}

/// NIC properties nested under a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lan: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_active: Option<bool>,
}

/// Firewall rule properties nested under a NIC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_end: Option<i64>,
}

/// A NIC with its nested firewall rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NicProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<NicEntities>,
}

/// Sub-collections attached to a NIC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NicEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewallrules: Option<Collection<FirewallRuleProperties>>,
}

/// Sub-collections attached to a server (depth >= 2 on reads).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Collection<VolumeProperties>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nics: Option<NicList>,
}

/// The NIC collection under a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NicList {
    #[serde(default = "Vec::new")]
    pub items: Vec<Nic>,
}

/// A server with its nested entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ServerProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<ServerEntities>,
}

impl Server {
    /// The server UUID, if the API returned one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The lifecycle state, if the API returned one.
    pub fn state(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.state.as_deref())
    }
}

/// The server collection under a datacenter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerList {
    #[serde(default = "Vec::new")]
    pub items: Vec<Server>,
}

/// LAN properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Network security group properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A security group rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// INGRESS or EGRESS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range_end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

/// Rule collection attached to a security group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroupEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Collection<SecurityGroupRuleProperties>>,
}

/// A security group with its rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SecurityGroupProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<SecurityGroupEntities>,
}

impl SecurityGroup {
    /// The group UUID, if the API returned one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The lifecycle state, if the API returned one.
    pub fn state(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.state.as_deref())
    }
}

/// The security group collection under a datacenter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroupList {
    #[serde(default = "Vec::new")]
    pub items: Vec<SecurityGroup>,
}

// =============================================================================
// Servers
// =============================================================================

pub async fn list_servers(client: &IonosClient, dc: &str) -> Result<ServerList, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/servers?depth=2", dc)))
        .await
}

pub async fn get_server(client: &IonosClient, dc: &str, id: &str) -> Result<Server, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/servers/{}?depth=2", dc, id)))
        .await
}

pub async fn create_server(
    client: &IonosClient,
    dc: &str,
    server: &Server,
) -> Result<Server, ApiError> {
    client
        .post(client.cloud_url(&format!("datacenters/{}/servers", dc)), server)
        .await
}

pub async fn update_server(
    client: &IonosClient,
    dc: &str,
    id: &str,
    properties: &ServerProperties,
) -> Result<Server, ApiError> {
    client
        .patch(
            client.cloud_url(&format!("datacenters/{}/servers/{}", dc, id)),
            properties,
        )
        .await
}

pub async fn delete_server(client: &IonosClient, dc: &str, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.cloud_url(&format!("datacenters/{}/servers/{}", dc, id)))
        .await
}

// =============================================================================
// LANs
// =============================================================================

pub async fn list_lans(
    client: &IonosClient,
    dc: &str,
) -> Result<Collection<LanProperties>, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/lans?depth=1", dc)))
        .await
}

pub async fn get_lan(
    client: &IonosClient,
    dc: &str,
    id: &str,
) -> Result<Envelope<LanProperties>, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/lans/{}", dc, id)))
        .await
}

pub async fn create_lan(
    client: &IonosClient,
    dc: &str,
    properties: LanProperties,
) -> Result<Envelope<LanProperties>, ApiError> {
    client
        .post(
            client.cloud_url(&format!("datacenters/{}/lans", dc)),
            &Envelope::for_create(properties),
        )
        .await
}

pub async fn update_lan(
    client: &IonosClient,
    dc: &str,
    id: &str,
    properties: &LanProperties,
) -> Result<Envelope<LanProperties>, ApiError> {
    client
        .patch(
            client.cloud_url(&format!("datacenters/{}/lans/{}", dc, id)),
            properties,
        )
        .await
}

pub async fn delete_lan(client: &IonosClient, dc: &str, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.cloud_url(&format!("datacenters/{}/lans/{}", dc, id)))
        .await
}

// =============================================================================
// Network security groups
// =============================================================================

pub async fn list_security_groups(
    client: &IonosClient,
    dc: &str,
) -> Result<SecurityGroupList, ApiError> {
    client
        .get(client.cloud_url(&format!("datacenters/{}/securitygroups?depth=2", dc)))
        .await
}

pub async fn get_security_group(
    client: &IonosClient,
    dc: &str,
    id: &str,
) -> Result<SecurityGroup, ApiError> {
    client
        .get(client.cloud_url(&format!(
            "datacenters/{}/securitygroups/{}?depth=2",
            dc, id
        )))
        .await
}

pub async fn create_security_group(
    client: &IonosClient,
    dc: &str,
    group: &SecurityGroup,
) -> Result<SecurityGroup, ApiError> {
    client
        .post(
            client.cloud_url(&format!("datacenters/{}/securitygroups", dc)),
            group,
        )
        .await
}

pub async fn update_security_group(
    client: &IonosClient,
    dc: &str,
    id: &str,
    group: &SecurityGroup,
) -> Result<SecurityGroup, ApiError> {
    client
        .put(
            client.cloud_url(&format!("datacenters/{}/securitygroups/{}", dc, id)),
            group,
        )
        .await
}

pub async fn delete_security_group(
    client: &IonosClient,
    dc: &str,
    id: &str,
) -> Result<(), ApiError> {
    client
        .delete(client.cloud_url(&format!("datacenters/{}/securitygroups/{}", dc, id)))
        .await
}
