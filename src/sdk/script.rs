//! Script injection

use crate::error::Result;
use async_trait::async_trait;

/// Host page able to inject external scripts
///
/// `append_script` resolves once the script has loaded. A failed append must
/// not leave the script registered, otherwise a retry would be skipped.
#[async_trait]
pub trait ScriptHost: Send + Sync + 'static {
    /// Whether a script with this exact `src` is already present
    fn has_script(&self, src: &str) -> bool;

    /// Inject a script and wait for it to load
    async fn append_script(&self, src: &str) -> Result<()>;
}

/// Load `src` into `host` unless it is already present
pub async fn load_script(host: &dyn ScriptHost, src: &str) -> Result<()> {
    if host.has_script(src) {
        tracing::debug!("script already present: {}", src);
        return Ok(());
    }

    tracing::debug!("loading script: {}", src);
    host.append_script(src).await
}
