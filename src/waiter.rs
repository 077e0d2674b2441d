//! State-change waiter.
//!
//! A bounded poll loop used after create, update, and delete: probe the
//! resource at a fixed cadence until it reaches the target state, fails, or
//! the deadline from the resource's `timeouts` block runs out. Transient API
//! errors are retried until the deadline; the last observation is surfaced
//! on timeout. Cancellation comes for free from the caller dropping the
//! future.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::error::ProviderError;

/// What a probe observed.
#[derive(Debug)]
pub enum Readiness<T> {
    /// The target state was reached.
    Ready(T),
    /// Still in flight; the string is the observed state, for reporting.
    Pending(String),
    /// The resource will never reach the target state; abort immediately.
    Failed(String),
}

/// Poll cadence and budget for one wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Time between probes.
    pub interval: Duration,
    /// Overall budget for the wait.
    pub deadline: Duration,
}

impl WaitConfig {
    /// Default cadence of one probe every five seconds.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// A wait with the default interval and the given budget.
    pub fn new(deadline: Duration) -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            deadline,
        }
    }

    /// Override the probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll `probe` until it reports [`Readiness::Ready`].
///
/// `what` names the awaited resource in errors and logs. The first probe
/// fires immediately, so an already-settled resource costs no sleep.
pub async fn wait_until<T, F, Fut>(
    config: WaitConfig,
    what: &str,
    mut probe: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness<T>, ProviderError>>,
{
    let started = Instant::now();
    let mut last_observation = "nothing observed yet".to_string();

    loop {
        match probe().await {
            Ok(Readiness::Ready(value)) => return Ok(value),
            Ok(Readiness::Pending(state)) => {
                debug!(what, state = %state, "still waiting");
                last_observation = format!("last state: {}", state);
            }
            Ok(Readiness::Failed(reason)) => {
                return Err(ProviderError::Internal(format!(
                    "{} entered a failed state: {}",
                    what, reason
                )));
            }
            Err(err) if is_retryable(&err) => {
                warn!(what, error = %err, "transient error while waiting, will retry");
                last_observation = format!("last error: {}", err);
            }
            Err(err) => return Err(err),
        }

        if started.elapsed() + config.interval > config.deadline {
            return Err(ProviderError::DeadlineExceeded(format!(
                "timed out waiting for {} after {:?} ({})",
                what, config.deadline, last_observation
            )));
        }
        tokio::time::sleep(config.interval).await;
    }
}

fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Api(ApiError::Http(_)) => true,
        ProviderError::Api(ApiError::Status { status, .. }) => {
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

/// Per-operation wait budgets, taken from the resource's `timeouts` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(60 * 60),
            update: Duration::from_secs(60 * 60),
            delete: Duration::from_secs(60 * 60),
        }
    }
}

impl Timeouts {
    /// Read the `timeouts` block out of a resource configuration, falling
    /// back to the defaults for anything unset.
    pub fn from_config(config: &serde_json::Value) -> Result<Self, ProviderError> {
        let mut timeouts = Self::default();
        let Some(block) = config.get("timeouts").filter(|v| !v.is_null()) else {
            return Ok(timeouts);
        };

        if let Some(value) = block.get("create").and_then(|v| v.as_str()) {
            timeouts.create = parse_duration(value)
                .map_err(|e| ProviderError::Validation(format!("timeouts.create: {}", e)))?;
        }
        if let Some(value) = block.get("update").and_then(|v| v.as_str()) {
            timeouts.update = parse_duration(value)
                .map_err(|e| ProviderError::Validation(format!("timeouts.update: {}", e)))?;
        }
        if let Some(value) = block.get("delete").and_then(|v| v.as_str()) {
            timeouts.delete = parse_duration(value)
                .map_err(|e| ProviderError::Validation(format!("timeouts.delete: {}", e)))?;
        }
        Ok(timeouts)
    }
}

/// Parse a duration string like `"90s"`, `"10m"`, or `"1h30m"`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    let mut seen_component = false;

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(format!("invalid duration '{}'", input));
        }
        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("invalid duration unit '{}' in '{}'", c, input)),
        };
        total += Duration::from_secs(amount * unit);
        digits.clear();
        seen_component = true;
    }

    if !digits.is_empty() || !seen_component {
        return Err(format!(
            "invalid duration '{}', expected forms like '90s', '10m', '1h30m'",
            input
        ));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> WaitConfig {
        WaitConfig::new(Duration::from_millis(50)).with_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_wait_until_ready_on_first_probe() {
        let result = wait_until(fast(), "lan", || async {
            Ok(Readiness::Ready("done"))
        })
        .await
        .unwrap();
        assert_eq!(result, "done");
    }

    #[tokio::test]
    async fn test_wait_until_polls_until_ready() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);

        let result = wait_until(fast(), "server", move || {
            let calls = Arc::clone(&probe_calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Ok(Readiness::Pending("BUSY".to_string()))
                } else {
                    Ok(Readiness::Ready(42))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_wait_until_times_out_with_last_state() {
        let err = wait_until(fast(), "server", || async {
            Ok::<Readiness<()>, ProviderError>(Readiness::Pending("BUSY".to_string()))
        })
        .await
        .unwrap_err();

        match err {
            ProviderError::DeadlineExceeded(msg) => {
                assert!(msg.contains("server"));
                assert!(msg.contains("BUSY"));
            }
            other => panic!("expected DeadlineExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_until_aborts_on_failed_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);

        let err = wait_until(fast(), "cluster", move || {
            probe_calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Readiness<()>, ProviderError>(Readiness::Failed("quota".to_string())) }
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("failed state"));
        // aborted on the first probe, well before the deadline
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_until_retries_transient_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);

        let result = wait_until(fast(), "zone", move || {
            let calls = Arc::clone(&probe_calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::Api(ApiError::Status {
                        status: reqwest::StatusCode::BAD_GATEWAY,
                        message: "upstream hiccup".to_string(),
                    }))
                } else {
                    Ok(Readiness::Ready(()))
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wait_until_does_not_retry_user_errors() {
        let err = wait_until(fast(), "zone", || async {
            Err::<Readiness<()>, _>(ProviderError::Validation("bad input".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration(" 5m ").unwrap(), Duration::from_secs(300));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("m10").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn test_timeouts_from_config() {
        let timeouts = Timeouts::from_config(&json!({})).unwrap();
        assert_eq!(timeouts, Timeouts::default());

        let timeouts = Timeouts::from_config(&json!({
            "timeouts": {"create": "10m", "delete": "30m"}
        }))
        .unwrap();
        assert_eq!(timeouts.create, Duration::from_secs(600));
        assert_eq!(timeouts.update, Timeouts::default().update);
        assert_eq!(timeouts.delete, Duration::from_secs(1800));

        let err = Timeouts::from_config(&json!({"timeouts": {"create": "soon"}})).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
