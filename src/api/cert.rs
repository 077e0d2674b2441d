//! Certificate Manager API.

use serde::{Deserialize, Serialize};

use super::{ApiError, Collection, Envelope, IonosClient};

/// Certificate properties.
///
/// The private key is write-only: it is sent on create and never returned
/// on reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// PEM-encoded leaf certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// PEM-encoded chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<String>,
    /// PEM-encoded private key, write-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

pub async fn list_certificates(
    client: &IonosClient,
) -> Result<Collection<CertificateProperties>, ApiError> {
    client.get(client.certs_url("certificates")).await
}

pub async fn get_certificate(
    client: &IonosClient,
    id: &str,
) -> Result<Envelope<CertificateProperties>, ApiError> {
    client
        .get(client.certs_url(&format!("certificates/{}", id)))
        .await
}

pub async fn create_certificate(
    client: &IonosClient,
    properties: CertificateProperties,
) -> Result<Envelope<CertificateProperties>, ApiError> {
    client
        .post(
            client.certs_url("certificates"),
            &Envelope::for_create(properties),
        )
        .await
}

/// Only the name is mutable after upload.
pub async fn rename_certificate(
    client: &IonosClient,
    id: &str,
    name: &str,
) -> Result<Envelope<CertificateProperties>, ApiError> {
    client
        .patch(
            client.certs_url(&format!("certificates/{}", id)),
            &Envelope::for_create(CertificateProperties {
                name: Some(name.to_string()),
                ..Default::default()
            }),
        )
        .await
}

pub async fn delete_certificate(client: &IonosClient, id: &str) -> Result<(), ApiError> {
    client
        .delete(client.certs_url(&format!("certificates/{}", id)))
        .await
}
