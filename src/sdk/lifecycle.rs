//! SDK Lifecycle Manager
//!
//! Brings a third-party SDK up at most once at a time, retries with
//! backoff, and gates every dependent operation.
//!
//! ## Lifecycle
//!
//! ```text
//!            init()
//! Idle ───────────────▶ Loading ──ok──▶ Loaded
//!   ▲                    │  ▲                │
//!   │                    │  └─retry (backoff)│
//!   └──── retries exhausted / reset() ◀──────┘
//! ```
//!
//! Concurrent `init` callers share one in-flight attempt and all observe its
//! result.

use crate::config::{SdkOptions, SdkOverrides};
use crate::error::{Error, Result};
use crate::helpers::{timeout_message, with_timeout};
use crate::sdk::SdkLoader;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type InitFuture = Shared<BoxFuture<'static, bool>>;

/// Observable load status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadStatus {
    pub loaded: bool,
    pub loading: bool,
    pub retry_count: u32,
}

struct LifecycleState {
    loaded: bool,
    retry_count: u32,
    options: SdkOptions,
    in_flight: Option<InitFuture>,
    /// Bumped by `reset`; attempts from older generations are discarded
    generation: u64,
}

struct LifecycleInner<L> {
    loader: L,
    state: Mutex<LifecycleState>,
}

enum Step {
    Done(bool),
    Retry(Duration),
}

impl<L: SdkLoader> LifecycleInner<L> {
    async fn run(self: Arc<Self>, generation: u64) -> bool {
        let name = self.loader.name().to_string();

        loop {
            let options = {
                let state = self.state.lock();
                if state.generation != generation {
                    return false;
                }
                state.options.clone()
            };
            let result = with_timeout(
                self.loader.load(&options),
                options.timeout,
                timeout_message(&format!("{name} SDK load"), options.timeout),
            )
            .await;

            let step = {
                let mut state = self.state.lock();
                if state.generation != generation {
                    tracing::debug!("{}: discarding load result after reset", name);
                    return false;
                }

                match result {
                    Ok(()) => {
                        state.loaded = true;
                        state.retry_count = 0;
                        state.in_flight = None;
                        tracing::info!("{}: SDK initialized", name);
                        Step::Done(true)
                    }
                    Err(e) if state.retry_count < options.max_retries => {
                        state.retry_count += 1;
                        tracing::warn!(
                            "{}: SDK load failed: {} - retrying ({}/{})",
                            name,
                            e,
                            state.retry_count,
                            options.max_retries
                        );
                        Step::Retry(options.backoff.delay_for(state.retry_count))
                    }
                    Err(e) => {
                        state.in_flight = None;
                        tracing::error!(
                            "{}: SDK load failed after {} attempts: {}",
                            name,
                            state.retry_count + 1,
                            e
                        );
                        Step::Done(false)
                    }
                }
            };

            match step {
                Step::Done(loaded) => return loaded,
                Step::Retry(delay) if !delay.is_zero() => tokio::time::sleep(delay).await,
                Step::Retry(_) => {}
            }
        }
    }
}

/// Lifecycle manager around an [`SdkLoader`]
///
/// Cheap to clone; clones share the same lifecycle.
pub struct SdkLifecycle<L> {
    inner: Arc<LifecycleInner<L>>,
}

impl<L> Clone for SdkLifecycle<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L: SdkLoader> SdkLifecycle<L> {
    /// Wrap `loader` with instance-level `options`
    pub fn new(loader: L, options: SdkOptions) -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                loader,
                state: Mutex::new(LifecycleState {
                    loaded: false,
                    retry_count: 0,
                    options,
                    in_flight: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Bring the SDK up
    ///
    /// Returns `true` once loaded. Joins an attempt already in flight instead
    /// of starting another. `overrides` apply only when a new attempt starts.
    /// Never fails: exhausted retries (or invalid overrides) yield `false`.
    pub async fn init(&self, overrides: &SdkOverrides) -> bool {
        let attempt = {
            let mut state = self.inner.state.lock();
            if state.loaded {
                return true;
            }

            if let Some(in_flight) = state.in_flight.clone() {
                in_flight
            } else {
                match state.options.merged(overrides) {
                    Ok(options) => state.options = options,
                    Err(e) => {
                        tracing::error!("{}: rejected init options: {}", self.name(), e);
                        return false;
                    }
                }

                state.retry_count = 0;
                let attempt = self.inner.clone().run(state.generation).boxed().shared();
                state.in_flight = Some(attempt.clone());
                attempt
            }
        };

        attempt.await
    }

    /// Initialize if needed, failing with [`Error::SdkUnavailable`]
    ///
    /// Guard for user-initiated operations that cannot proceed without the SDK.
    pub async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() || self.init(&SdkOverrides::none()).await {
            Ok(())
        } else {
            Err(Error::SdkUnavailable {
                sdk: self.name().to_string(),
            })
        }
    }

    /// Run an SDK-dependent operation behind the init guard and the timeout
    pub async fn guarded<'a, T, F, Fut>(&'a self, operation: &str, op: F) -> Result<T>
    where
        F: FnOnce(&'a L) -> Fut,
        Fut: Future<Output = Result<T>> + 'a,
    {
        self.ensure_initialized().await?;
        let timeout = self.timeout();
        with_timeout(op(&self.inner.loader), timeout, timeout_message(operation, timeout)).await
    }

    /// Forget all lifecycle state so the next `init` starts fresh
    ///
    /// An attempt still in flight finishes in the background and is ignored.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.loaded = false;
        state.retry_count = 0;
        state.in_flight = None;
        state.generation += 1;
        tracing::debug!("{}: lifecycle reset", self.name());
    }

    /// Whether the SDK is loaded
    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().loaded
    }

    /// Current load status
    pub fn load_status(&self) -> LoadStatus {
        let state = self.inner.state.lock();
        LoadStatus {
            loaded: state.loaded,
            loading: state.in_flight.is_some(),
            retry_count: state.retry_count,
        }
    }

    /// Timeout applied to loads and guarded operations
    pub fn timeout(&self) -> Duration {
        self.inner.state.lock().options.timeout
    }

    /// Currently resolved options
    pub fn options(&self) -> SdkOptions {
        self.inner.state.lock().options.clone()
    }

    /// The wrapped loader
    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// Loader name
    pub fn name(&self) -> &str {
        self.inner.loader.name()
    }
}

impl<L: SdkLoader> std::fmt::Debug for SdkLifecycle<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkLifecycle")
            .field("sdk", &self.name())
            .field("status", &self.load_status())
            .finish()
    }
}
