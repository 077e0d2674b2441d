//! Clients for the IONOS Cloud REST APIs.
//!
//! One [`IonosClient`] carries the HTTP client, the credentials, and the
//! per-service base URLs (Cloud API, DNS, Logging, VPN, DBaaS Postgres,
//! Certificate Manager). Service modules build URLs and deserialize the
//! JSON envelopes; all transport concerns live here.

pub mod cert;
pub mod compute;
pub mod dbaas;
pub mod dns;
pub mod logs;
pub mod nlb;
pub mod vpn;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Maximum length of a response body excerpt kept in errors and logs.
const MAX_BODY_EXCERPT: usize = 200;

/// Lifecycle state reported in resource metadata.
pub const STATE_AVAILABLE: &str = "AVAILABLE";
/// The resource is being provisioned or updated.
pub const STATE_BUSY: &str = "BUSY";
/// The resource is being deleted.
pub const STATE_DESTROYING: &str = "DESTROYING";
/// Provisioning failed; the resource will not become available.
pub const STATE_FAILED: &str = "FAILED";

/// Errors from the IONOS REST layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote object does not exist (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The request URL that returned 404.
        url: String,
    },

    /// Any other non-success status.
    #[error("API request failed with {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// A sanitized excerpt of the response body.
        message: String,
    },

    /// The request could not be sent or the response body not read.
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("invalid response payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// A configured endpoint is not a valid URL.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this error means the remote object is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Credentials used against every IONOS API.
#[derive(Clone)]
pub enum Credentials {
    /// A bearer token (`IONOS_TOKEN`).
    Token(String),
    /// Basic auth (`IONOS_USERNAME` / `IONOS_PASSWORD`).
    Basic {
        /// The account username.
        username: String,
        /// The account password.
        password: String,
    },
}

impl Credentials {
    /// Read credentials from the environment, preferring a token.
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = std::env::var("IONOS_TOKEN") {
            if !token.is_empty() {
                return Some(Self::Token(token));
            }
        }
        match (
            std::env::var("IONOS_USERNAME"),
            std::env::var("IONOS_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self::Basic { username, password })
            }
            _ => None,
        }
    }
}

// Credentials never appear in logs or debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Credentials::Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Base URLs for the IONOS service APIs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Cloud API v6 (compute, LANs, NLBs, security groups).
    pub cloud: String,
    /// Cloud DNS API.
    pub dns: String,
    /// Logging Service API.
    pub logs: String,
    /// VPN Gateway API.
    pub vpn: String,
    /// DBaaS Postgres API.
    pub dbaas_pg: String,
    /// Certificate Manager API.
    pub certs: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cloud: "https://api.ionos.com/cloudapi/v6".to_string(),
            dns: "https://dns.de-fra.ionos.com".to_string(),
            logs: "https://logging.de-txl.ionos.com".to_string(),
            vpn: "https://vpn.de-fra.ionos.com".to_string(),
            dbaas_pg: "https://api.ionos.com/databases/postgresql".to_string(),
            certs: "https://api.ionos.com/certificatemanager".to_string(),
        }
    }
}

impl Endpoints {
    /// Derive every service URL from a single base, used when the provider
    /// configuration overrides `endpoint` (tests point this at a mock).
    pub fn rooted_at(base: &str) -> Result<Self, ApiError> {
        // Parsed only to reject malformed overrides early
        Url::parse(base)?;
        let base = base.trim_end_matches('/');
        Ok(Self {
            cloud: format!("{}/cloudapi/v6", base),
            dns: format!("{}/dns", base),
            logs: format!("{}/logging", base),
            vpn: format!("{}/vpn", base),
            dbaas_pg: format!("{}/databases/postgresql", base),
            certs: format!("{}/certificatemanager", base),
        })
    }
}

/// HTTP client for the IONOS REST APIs.
#[derive(Debug, Clone)]
pub struct IonosClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: Endpoints,
}

impl IonosClient {
    /// Create a new client with the given credentials and endpoints.
    pub fn new(credentials: Credentials, endpoints: Endpoints) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ionoscloud-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            credentials,
            endpoints,
        })
    }

    /// The configured service endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Build a Cloud API URL.
    pub fn cloud_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.cloud, path)
    }

    /// Build a DNS API URL.
    pub fn dns_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.dns, path)
    }

    /// Build a Logging Service API URL.
    pub fn logs_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.logs, path)
    }

    /// Build a VPN Gateway API URL.
    pub fn vpn_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.vpn, path)
    }

    /// Build a DBaaS Postgres API URL.
    pub fn pg_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.dbaas_pg, path)
    }

    /// Build a Certificate Manager API URL.
    pub fn certs_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.certs, path)
    }

    /// GET a JSON document.
    pub async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let value = self.send(Method::GET, &url, None).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// POST a JSON body, returning the created document.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Decode)?;
        let value = self.send(Method::POST, &url, Some(body)).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// PUT a JSON body, returning the stored document.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Decode)?;
        let value = self.send(Method::PUT, &url, Some(body)).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// PATCH a JSON body, returning the stored document.
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Decode)?;
        let value = self.send(Method::PATCH, &url, Some(body)).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// DELETE a remote object.
    pub async fn delete(&self, url: String) -> Result<(), ApiError> {
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        tracing::debug!(%method, url, "IONOS API request");

        let mut request = self.http.request(method, url);
        request = match &self.credentials {
            Credentials::Token(token) => request.bearer_auth(token),
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            // Only a sanitized excerpt of the body reaches logs and errors
            tracing::error!(%status, url, "API error: {}", excerpt(&text));
            return Err(ApiError::Status {
                status,
                message: excerpt(&text),
            });
        }

        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(ApiError::Decode)
    }
}

/// Truncate and strip a response body for logging and error messages.
fn excerpt(body: &str) -> String {
    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    if cleaned.len() > MAX_BODY_EXCERPT {
        format!(
            "{}... [truncated, {} bytes total]",
            &cleaned[..MAX_BODY_EXCERPT],
            body.len()
        )
    } else {
        cleaned
    }
}

/// Lifecycle metadata carried on every IONOS resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// AVAILABLE / BUSY / DESTROYING / FAILED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Creation timestamp, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    /// Authoritative nameservers (DNS zones only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
}

/// The wire envelope around a single resource: `id` + `metadata` +
/// `properties`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct Envelope<P> {
    /// The resource UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Lifecycle metadata, absent in request bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// The resource properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<P>,
}

impl<P> Envelope<P> {
    /// Build a request body carrying only properties.
    pub fn for_create(properties: P) -> Self {
        Self {
            id: None,
            metadata: None,
            properties: Some(properties),
        }
    }

    /// The resource id, if the API returned one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The lifecycle state, if the API returned one.
    pub fn state(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.state.as_deref())
    }
}

/// The wire envelope around a collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<P> {
    /// The listed resources.
    #[serde(default = "Vec::new")]
    pub items: Vec<Envelope<P>>,
}

/// A reference to another resource by id (e.g. a server's boot volume).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRef {
    /// The referenced resource UUID.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_excerpt_truncates_and_sanitizes() {
        let long = "x".repeat(500);
        let out = excerpt(&long);
        assert!(out.starts_with(&"x".repeat(200)));
        assert!(out.contains("truncated, 500 bytes total"));

        let messy = "bad\u{1}body\nhere";
        assert_eq!(excerpt(messy), "badbodyhere");
    }

    #[test]
    fn test_endpoints_rooted_at() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:8080/").unwrap();
        assert_eq!(endpoints.cloud, "http://127.0.0.1:8080/cloudapi/v6");
        assert_eq!(endpoints.dns, "http://127.0.0.1:8080/dns");
        assert_eq!(
            endpoints.dbaas_pg,
            "http://127.0.0.1:8080/databases/postgresql"
        );

        assert!(Endpoints::rooted_at("not a url").is_err());
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let token = Credentials::Token("secret-token".to_string());
        assert!(!format!("{:?}", token).contains("secret-token"));

        let basic = Credentials::Basic {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", basic);
        assert!(debug.contains("user@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_envelope_deserializes_wire_shape() {
        #[derive(Debug, serde::Deserialize)]
        struct Props {
            name: String,
        }

        let envelope: Envelope<Props> = serde_json::from_value(json!({
            "id": "lan-1",
            "metadata": {"state": "AVAILABLE", "createdDate": "2026-01-01T00:00:00Z"},
            "properties": {"name": "backbone"}
        }))
        .unwrap();

        assert_eq!(envelope.id(), Some("lan-1"));
        assert_eq!(envelope.state(), Some(STATE_AVAILABLE));
        assert_eq!(envelope.properties.unwrap().name, "backbone");
    }

    #[test]
    fn test_envelope_create_body_omits_metadata() {
        #[derive(Debug, serde::Serialize)]
        struct Props {
            name: String,
        }

        let body = serde_json::to_value(Envelope::for_create(Props {
            name: "backbone".to_string(),
        }))
        .unwrap();

        assert_eq!(body, json!({"properties": {"name": "backbone"}}));
    }

    #[test]
    fn test_collection_defaults_to_empty() {
        #[derive(Debug, serde::Deserialize)]
        struct Props {}

        let collection: Collection<Props> = serde_json::from_value(json!({})).unwrap();
        assert!(collection.items.is_empty());
    }
}
