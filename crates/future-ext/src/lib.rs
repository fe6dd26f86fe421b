//! Extension traits for futures.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

use std::time::Duration;

/// Extends all futures with timeout helpers.
pub trait FutureExt: Sized {
    /// Wraps the future so that it errors with
    /// [`Elapsed`](tokio::time::error::Elapsed) if it does not complete
    /// within `duration`.
    fn with_timeout(self, duration: Duration) -> tokio::time::Timeout<Self>;
}

impl<F: Future> FutureExt for F {
    fn with_timeout(self, duration: Duration) -> tokio::time::Timeout<Self> {
        tokio::time::timeout(duration, self)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::time::Duration;

    use super::FutureExt;

    #[tokio::test]
    async fn with_timeout_completes() {
        let value = async { 42 }.with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn with_timeout_elapses() {
        let result = std::future::pending::<()>().with_timeout(Duration::from_millis(10)).await;
        assert!(result.is_err());
    }
}
