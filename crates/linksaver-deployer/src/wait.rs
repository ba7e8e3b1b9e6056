//! Readiness polling with exponential backoff and cancellation support.
//!
//! Replaces provider-side waiters: a generic poll-until-ready loop with
//! configurable backoff and a cancellable fixed settling delay.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Configuration for readiness polling.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(120),
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Poll `check` until it reports ready, backing off exponentially.
///
/// `check` returns `Ok(true)` when the resource is ready, `Ok(false)` to
/// retry, `Err` to abort. The optional token cancels the wait between
/// attempts.
pub async fn wait_for_resource<F, Fut>(
    config: WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();
    let mut delays = backoff.into_iter();

    loop {
        attempts += 1;

        if let Some(token) = cancel {
            if token.is_cancelled() {
                anyhow::bail!("Wait for {} cancelled", resource_name);
            }
        }

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                resource_name,
                config.timeout,
                attempts
            );
        }

        if check().await? {
            debug!(resource = %resource_name, attempts, "Resource ready");
            return Ok(());
        }

        let delay = delays.next().unwrap_or(config.max_delay);
        debug!(
            resource = %resource_name,
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Resource not ready, retrying"
        );
        sleep_cancellable(delay, cancel, resource_name).await?;
    }
}

/// Fixed settling delay, cancellable. Used where a service is eventually
/// consistent but exposes nothing to poll (IAM role propagation).
pub async fn settle_delay(
    delay: Duration,
    cancel: Option<&CancellationToken>,
    resource_name: &str,
) -> Result<()> {
    debug!(resource = %resource_name, delay_secs = delay.as_secs(), "Settling delay");
    sleep_cancellable(delay, cancel, resource_name).await
}

async fn sleep_cancellable(
    delay: Duration,
    cancel: Option<&CancellationToken>,
    resource_name: &str,
) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        } => {
            anyhow::bail!("Wait for {} cancelled", resource_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn ready_on_first_check() {
        let result = wait_for_resource(
            WaitConfig::default(),
            None,
            || async { Ok(true) },
            "immediate",
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn retries_until_ready() {
        let calls = AtomicU32::new(0);
        let config = WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        };
        wait_for_resource(
            config,
            None,
            || async { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) },
            "slow",
        )
        .await
        .unwrap();
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn check_error_aborts() {
        let result = wait_for_resource(
            WaitConfig::default(),
            None,
            || async { anyhow::bail!("broken") },
            "failing",
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("broken"));
    }

    #[tokio::test]
    async fn times_out() {
        let config = WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
        };
        let result = wait_for_resource(config, None, || async { Ok(false) }, "never").await;
        assert!(result.unwrap_err().to_string().contains("Timeout"));
    }

    #[tokio::test]
    async fn cancellation_interrupts_settle_delay() {
        let token = CancellationToken::new();
        token.cancel();
        let result = settle_delay(Duration::from_secs(60), Some(&token), "role").await;
        assert!(result.unwrap_err().to_string().contains("cancelled"));
    }
}
