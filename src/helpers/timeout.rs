//! Timeout wrapper
//!
//! Races an operation against a timer. The operation itself is not cancelled
//! on the caller's behalf beyond being dropped; the timer never outlives the
//! returned future.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run a fallible operation with a deadline
///
/// Returns the operation's own result when it finishes first, or
/// [`Error::Timeout`] carrying `message` when the timer fires first.
///
/// # Example
///
/// ```ignore
/// let contacts = with_timeout(
///     bridge.select_enterprise_contact(&options),
///     Duration::from_secs(10),
///     "select enterprise contact timed out (10000ms)",
/// )
/// .await?;
/// ```
pub async fn with_timeout<F, T>(future: F, duration: Duration, message: impl Into<String>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            message: message.into(),
        }),
    }
}

/// Build the standard "<operation> timed out (<ms>ms)" message
pub fn timeout_message(operation: &str, duration: Duration) -> String {
    format!("{operation} timed out ({}ms)", duration.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(7)
            },
            Duration::from_millis(100),
            "slow",
        )
        .await;
        assert_eq!(result.expect("value"), 7);

        // Advancing past the deadline must not produce anything further
        tokio::time::advance(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_wins() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result: Result<()> = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_millis(50),
            timeout_message("get location", Duration::from_millis(50)),
        )
        .await;

        let err = result.expect_err("should time out");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timeout: get location timed out (50ms)");

        // The losing operation was dropped with the race
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<()> = with_timeout(
            async { Err(Error::invalid("bad")) },
            Duration::from_secs(1),
            "unused",
        )
        .await;
        assert!(matches!(result, Err(Error::Invalid { .. })));
    }
}
