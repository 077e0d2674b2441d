//! In-process test harness for the provider.
//!
//! Drives a [`ProviderService`] implementation directly, without a gRPC
//! server in between. The crate's integration tests pair this with a mocked
//! IONOS API to exercise full CRUD lifecycles.
//!
//! # Example
//!
//! ```ignore
//! use ionoscloud_provider::testing::ProviderTester;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_lan() {
//!     let tester = ProviderTester::new(IonosProvider::new());
//!     tester.configure(json!({"token": "test"})).await.unwrap();
//!
//!     let state = tester
//!         .create("ionoscloud_lan", json!({"datacenter_id": "dc-1", "name": "backbone"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["name"], "backbone");
//! }
//! ```

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema, Severity};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use serde_json::Value;

/// A test harness wrapping a [`ProviderService`] implementation.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        self.read(resource_type, created_state).await
    }

    /// Run a full update lifecycle: plan → update → read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        self.read(resource_type, updated_state).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, Severity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan result indicates changes are needed.
///
/// # Panics
///
/// Panics if the plan has no changes.
pub fn assert_plan_has_changes(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes, but got no changes"
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan does not require resource replacement.
///
/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan does not have a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan has a change for the given path.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, Severity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Kind, Schema};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // A minimal in-memory provider for exercising the harness itself
    struct FakeProvider {
        store: Mutex<HashMap<String, Value>>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                store: Mutex::new(HashMap::new()),
            }
        }

        fn lan_schema() -> Schema {
            Schema::v0()
                .attr("id", Attribute::computed(Kind::String))
                .attr(
                    "datacenter_id",
                    Attribute::required(Kind::String).force_new(),
                )
                .attr("name", Attribute::optional(Kind::String))
        }
    }

    #[async_trait::async_trait]
    impl ProviderService for FakeProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .provider_config(
                    Schema::v0().attr("token", Attribute::optional(Kind::String).sensitive()),
                )
                .resource("fake_lan", Self::lan_schema())
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![])
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(crate::plan::plan(
                &Self::lan_schema(),
                prior_state.as_ref(),
                &proposed_state,
            ))
        }

        async fn create(
            &self,
            _resource_type: &str,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            let mut state = planned_state;
            if let Value::Object(map) = &mut state {
                map.insert("id".to_string(), json!("lan-1"));
            }
            self.store
                .lock()
                .expect("store poisoned")
                .insert("lan-1".to_string(), state.clone());
            Ok(state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<Value, ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            Ok(self
                .store
                .lock()
                .expect("store poisoned")
                .get(id)
                .cloned()
                .unwrap_or(Value::Null))
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            let id = planned_state["id"].as_str().unwrap_or_default().to_string();
            self.store
                .lock()
                .expect("store poisoned")
                .insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn delete(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<(), ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            self.store.lock().expect("store poisoned").remove(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let tester = ProviderTester::new(FakeProvider::new());
        assert!(tester.configure(json!({"token": "t"})).await.is_ok());
    }

    #[tokio::test]
    async fn test_tester_schema_and_metadata() {
        let tester = ProviderTester::new(FakeProvider::new());
        assert!(tester.schema().resources.contains_key("fake_lan"));
        assert!(tester.resource_types().contains(&"fake_lan".to_string()));
    }

    #[tokio::test]
    async fn test_tester_plan_create() {
        let tester = ProviderTester::new(FakeProvider::new());
        let plan = tester
            .plan_create("fake_lan", json!({"datacenter_id": "dc-1", "name": "backbone"}))
            .await
            .unwrap();

        assert_plan_has_changes(&plan);
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_updates_in_place(&plan);
    }

    #[tokio::test]
    async fn test_tester_plan_update_replacement() {
        let tester = ProviderTester::new(FakeProvider::new());
        let plan = tester
            .plan_update(
                "fake_lan",
                json!({"id": "lan-1", "datacenter_id": "dc-1"}),
                json!({"id": "lan-1", "datacenter_id": "dc-2"}),
            )
            .await
            .unwrap();

        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "datacenter_id");
        assert_plan_does_not_change_attribute(&plan, "id");
    }

    #[tokio::test]
    async fn test_tester_plan_update_no_changes() {
        let tester = ProviderTester::new(FakeProvider::new());
        let state = json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "same"});
        let plan = tester
            .plan_update("fake_lan", state.clone(), state)
            .await
            .unwrap();

        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_create() {
        let tester = ProviderTester::new(FakeProvider::new());
        let state = tester
            .lifecycle_create("fake_lan", json!({"datacenter_id": "dc-1", "name": "backbone"}))
            .await
            .unwrap();

        assert_eq!(state["name"], "backbone");
        assert_eq!(state["id"], "lan-1");
    }

    #[tokio::test]
    async fn test_tester_delete_then_read_gone() {
        let tester = ProviderTester::new(FakeProvider::new());
        let state = tester
            .lifecycle_create("fake_lan", json!({"datacenter_id": "dc-1"}))
            .await
            .unwrap();

        tester
            .lifecycle_delete("fake_lan", state.clone())
            .await
            .unwrap();

        let after = tester.read("fake_lan", state).await.unwrap();
        assert!(after.is_null());
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("an error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("no lan found with the specified criteria")];
        assert_error_contains(&diagnostics, "no lan found");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("first error").with_attribute("name"),
            Diagnostic::error("second error").with_detail("more info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("first error"));
        assert!(display.contains("second error"));
        assert!(display.contains("name"));
        assert!(display.contains("more info"));
    }
}
