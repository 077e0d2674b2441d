//! The IONOS Cloud provider: type registries and operation dispatch.
//!
//! One [`IonosProvider`] backs the whole plugin. Configuration builds the
//! shared [`IonosClient`]; every CRUD and data source call looks the type up
//! in the registry and hands it the client. No state is shared between
//! operations beyond that client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::info;

use crate::api::{Credentials, Endpoints, IonosClient};
use crate::datasources::{self, DataSourceHandler};
use crate::error::ProviderError;
use crate::plan;
use crate::resources::{self, ResourceHandler};
use crate::schema::{Attribute, Diagnostic, Kind, ProviderSchema, Schema, Severity};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// The provider plugin.
pub struct IonosProvider {
    api: RwLock<Option<Arc<IonosClient>>>,
    resources: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl IonosProvider {
    /// Create the provider with every resource and data source registered.
    pub fn new() -> Self {
        Self {
            api: RwLock::new(None),
            resources: resources::all()
                .into_iter()
                .map(|handler| (handler.type_name(), handler))
                .collect(),
            data_sources: datasources::all()
                .into_iter()
                .map(|handler| (handler.type_name(), handler))
                .collect(),
        }
    }

    fn provider_config_schema() -> Schema {
        Schema::v0()
            .attr(
                "token",
                Attribute::optional(Kind::String)
                    .sensitive()
                    .describe("bearer token; falls back to IONOS_TOKEN"),
            )
            .attr(
                "username",
                Attribute::optional(Kind::String).describe("falls back to IONOS_USERNAME"),
            )
            .attr(
                "password",
                Attribute::optional(Kind::String)
                    .sensitive()
                    .describe("falls back to IONOS_PASSWORD"),
            )
            .attr(
                "endpoint",
                Attribute::optional(Kind::String)
                    .describe("override every service URL, mainly for testing"),
            )
    }

    fn api(&self) -> Result<Arc<IonosClient>, ProviderError> {
        self.api
            .read()
            .map_err(|_| ProviderError::Internal("client lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| {
                ProviderError::Configuration("the provider has not been configured".to_string())
            })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn ResourceHandler, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| ProviderError::UnknownType(resource_type.to_string()))
    }

    fn data_source(
        &self,
        data_source_type: &str,
    ) -> Result<&dyn DataSourceHandler, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| ProviderError::UnknownType(data_source_type.to_string()))
    }

    fn credentials_from(config: &Value) -> Option<Credentials> {
        let token = config
            .get("token")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        if let Some(token) = token {
            return Some(Credentials::Token(token.to_string()));
        }

        let username = config
            .get("username")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let password = config
            .get("password")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Some(Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        }
    }

    fn endpoints_from(config: &Value) -> Result<Endpoints, ProviderError> {
        let override_url = config
            .get("endpoint")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var("IONOS_API_URL").ok().filter(|s| !s.is_empty()));

        match override_url {
            Some(url) => Endpoints::rooted_at(&url).map_err(|e| {
                ProviderError::Configuration(format!("invalid endpoint override: {}", e))
            }),
            None => Ok(Endpoints::default()),
        }
    }
}

impl Default for IonosProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for IonosProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().provider_config(Self::provider_config_schema());
        for (name, handler) in &self.resources {
            schema = schema.resource(*name, handler.schema());
        }
        for (name, handler) in &self.data_sources {
            schema = schema.data_source(*name, handler.schema());
        }
        schema
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&Self::provider_config_schema(), &config);

        let has_username = config.get("username").and_then(Value::as_str).is_some();
        let has_password = config.get("password").and_then(Value::as_str).is_some();
        if has_username != has_password {
            diagnostics.push(
                Diagnostic::error("'username' and 'password' must be set together")
                    .with_attribute(if has_username { "password" } else { "username" }),
            );
        }

        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = self.validate_provider_config(config.clone()).await?;
        if diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::Error))
        {
            return Ok(diagnostics);
        }

        let Some(credentials) = Self::credentials_from(&config).or_else(Credentials::from_env)
        else {
            return Ok(vec![Diagnostic::error("no credentials configured")
                .with_detail(
                    "set 'token' (or 'username' and 'password') in the provider block, \
                     or export IONOS_TOKEN / IONOS_USERNAME / IONOS_PASSWORD",
                )]);
        };

        let endpoints = Self::endpoints_from(&config)?;
        let client = IonosClient::new(credentials, endpoints)?;

        *self
            .api
            .write()
            .map_err(|_| ProviderError::Internal("client lock poisoned".to_string()))? =
            Some(Arc::new(client));

        info!(
            resources = self.resources.len(),
            data_sources = self.data_sources.len(),
            "provider configured"
        );
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        Ok(validation::validate(&schema, &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        Ok(plan::plan(&schema, prior_state.as_ref(), &proposed_state))
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let api = self.api()?;
        self.resource(resource_type)?.create(&api, planned_state).await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let api = self.api()?;
        self.resource(resource_type)?.read(&api, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let api = self.api()?;
        self.resource(resource_type)?
            .update(&api, prior_state, planned_state)
            .await
    }

    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let api = self.api()?;
        self.resource(resource_type)?.delete(&api, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let api = self.api()?;
        let state = self.resource(resource_type)?.import(&api, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.data_source(data_source_type)?.schema();
        Ok(validation::validate(&schema, &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let api = self.api()?;
        self.data_source(data_source_type)?.read(&api, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_schema_lists_all_registered_types() {
        let provider = IonosProvider::new();
        let schema = provider.schema();

        for resource in [
            "ionoscloud_server",
            "ionoscloud_lan",
            "ionoscloud_network_loadbalancer",
            "ionoscloud_network_security_group",
            "ionoscloud_dns_zone",
            "ionoscloud_dns_record",
            "ionoscloud_logging_pipeline",
            "ionoscloud_vpn_wireguard_gateway",
            "ionoscloud_vpn_wireguard_peer",
            "ionoscloud_pg_cluster",
            "ionoscloud_certificate",
        ] {
            assert!(schema.resources.contains_key(resource), "{}", resource);
        }

        for data_source in [
            "ionoscloud_server",
            "ionoscloud_lan",
            "ionoscloud_network_loadbalancer",
            "ionoscloud_network_security_group",
            "ionoscloud_dns_zone",
            "ionoscloud_logging_pipeline",
            "ionoscloud_vpn_wireguard_gateway",
            "ionoscloud_pg_cluster",
            "ionoscloud_certificate",
        ] {
            assert!(
                schema.data_sources.contains_key(data_source),
                "{}",
                data_source
            );
        }

        assert!(schema.provider.block.attributes["token"].sensitive);
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let provider = IonosProvider::new();
        let err = provider
            .plan("ionoscloud_teapot", None, json!({}), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownType(_)));
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = IonosProvider::new();
        let err = provider
            .read("ionoscloud_lan", json!({"id": "lan-1", "datacenter_id": "dc-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_with_token() {
        let provider = IonosProvider::new();
        let diagnostics = provider
            .configure(json!({"token": "test-token"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert!(provider.api().is_ok());
    }

    #[tokio::test]
    async fn test_configure_rejects_lone_username() {
        let provider = IonosProvider::new();
        let diagnostics = provider
            .configure(json!({"username": "user@example.com"}))
            .await
            .unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.summary.contains("must be set together")));
    }

    #[tokio::test]
    async fn test_plan_uses_resource_schema() {
        let provider = IonosProvider::new();
        let prior = json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "a", "public": false});
        let proposed = json!({"id": "lan-1", "datacenter_id": "dc-2", "name": "a", "public": false});

        let result = provider
            .plan("ionoscloud_lan", Some(prior), proposed, json!({}))
            .await
            .unwrap();
        assert!(result.requires_replace);
    }

    #[tokio::test]
    async fn test_validate_resource_config_reports_missing_required() {
        let provider = IonosProvider::new();
        let diagnostics = provider
            .validate_resource_config("ionoscloud_server", json!({"name": "web-1"}))
            .await
            .unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.attribute.as_deref() == Some("datacenter_id")));
    }
}
