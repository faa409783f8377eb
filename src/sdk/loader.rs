//! SDK Loader seam
//!
//! A loader performs exactly one attempt at bringing an external SDK up
//! (script load, signature handshake, ...). Retry, de-duplication and
//! timeouts belong to [`SdkLifecycle`](super::SdkLifecycle).

use crate::config::SdkOptions;
use crate::error::Result;
use async_trait::async_trait;

/// One-shot SDK bootstrap
#[async_trait]
pub trait SdkLoader: Send + Sync + 'static {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Attempt to load the SDK once
    async fn load(&self, options: &SdkOptions) -> Result<()>;
}
