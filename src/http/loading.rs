//! Global Loading Indicator
//!
//! Counts requests in flight. The indicator is shown when the count leaves
//! zero and hidden when it returns to zero, but never before it has been
//! visible for the minimum display time. A request starting while a hide is
//! pending cancels the hide.

use crate::constants::LOADING_MIN_DISPLAY_MS;
use crate::http::Notice;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct LoadingState {
    in_flight: usize,
    visible: bool,
    shown_at: Option<Instant>,
    /// Bumped whenever a pending hide must be abandoned
    hide_generation: u64,
}

/// Shared request counter driving show/hide notices
#[derive(Clone)]
pub struct LoadingIndicator {
    state: Arc<Mutex<LoadingState>>,
    notices: Sender<Notice>,
    min_display: Duration,
}

impl LoadingIndicator {
    pub fn new(notices: Sender<Notice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoadingState::default())),
            notices,
            min_display: Duration::from_millis(LOADING_MIN_DISPLAY_MS),
        }
    }

    pub fn with_min_display(mut self, min_display: Duration) -> Self {
        self.min_display = min_display;
        self
    }

    /// Requests currently counted
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Count a request until the returned guard is dropped
    pub fn begin(&self) -> LoadingGuard {
        let show = {
            let mut state = self.state.lock();
            state.in_flight += 1;
            if state.in_flight == 1 {
                state.hide_generation += 1;
            }
            if state.visible {
                false
            } else {
                state.visible = true;
                state.shown_at = Some(Instant::now());
                true
            }
        };

        if show {
            self.publish(Notice::show_loading());
        }
        LoadingGuard {
            indicator: self.clone(),
        }
    }

    fn end(&self) {
        let (generation, remaining) = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight > 0 || !state.visible {
                return;
            }
            let elapsed = state.shown_at.map(|t| t.elapsed()).unwrap_or_default();
            (state.hide_generation, self.min_display.saturating_sub(elapsed))
        };

        if remaining.is_zero() {
            self.hide_if_current(generation);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let indicator = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(remaining).await;
                    indicator.hide_if_current(generation);
                });
            }
            // Outside a runtime there is no timer to wait on
            Err(_) => self.hide_if_current(generation),
        }
    }

    fn hide_if_current(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.hide_generation != generation || state.in_flight > 0 || !state.visible {
                return;
            }
            state.visible = false;
            state.shown_at = None;
        }
        self.publish(Notice::hide_loading());
    }

    fn publish(&self, notice: Notice) {
        if let Err(e) = self.notices.send(notice) {
            tracing::debug!("loading notice dropped, receiver gone: {e}");
        }
    }
}

impl std::fmt::Debug for LoadingIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LoadingIndicator")
            .field("in_flight", &state.in_flight)
            .field("visible", &state.visible)
            .finish()
    }
}

/// Keeps one request counted; dropping it (even on cancellation) ends it
#[must_use]
pub struct LoadingGuard {
    indicator: LoadingIndicator,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.indicator.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{NoticeLevel, notice_channel};
    use crossbeam_channel::Receiver;

    fn levels(rx: &Receiver<Notice>) -> Vec<NoticeLevel> {
        rx.try_iter().map(|n| n.level).collect()
    }

    /// Let spawned hide tasks run up to the current paused instant
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_requests_show_once() {
        let (tx, rx) = notice_channel();
        let indicator = LoadingIndicator::new(tx);

        let first = indicator.begin();
        let second = indicator.begin();
        assert_eq!(indicator.in_flight(), 2);
        assert_eq!(levels(&rx), vec![NoticeLevel::ShowLoading]);

        tokio::time::advance(Duration::from_millis(500)).await;
        drop(first);
        settle().await;
        assert!(indicator.is_visible());
        assert!(levels(&rx).is_empty());

        drop(second);
        settle().await;
        assert!(!indicator.is_visible());
        assert_eq!(levels(&rx), vec![NoticeLevel::HideLoading]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_waits_for_min_display() {
        let (tx, rx) = notice_channel();
        let indicator = LoadingIndicator::new(tx);

        let guard = indicator.begin();
        tokio::time::advance(Duration::from_millis(100)).await;
        drop(guard);
        settle().await;
        assert_eq!(levels(&rx), vec![NoticeLevel::ShowLoading]);

        tokio::time::advance(Duration::from_millis(150)).await;
        settle().await;
        assert!(indicator.is_visible());

        tokio::time::advance(Duration::from_millis(60)).await;
        settle().await;
        assert!(!indicator.is_visible());
        assert_eq!(levels(&rx), vec![NoticeLevel::HideLoading]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_during_pending_hide_keeps_indicator() {
        let (tx, rx) = notice_channel();
        let indicator = LoadingIndicator::new(tx);

        drop(indicator.begin());
        settle().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        let again = indicator.begin();

        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert!(indicator.is_visible());
        assert_eq!(levels(&rx), vec![NoticeLevel::ShowLoading]);

        drop(again);
        settle().await;
        assert_eq!(levels(&rx), vec![NoticeLevel::HideLoading]);
    }

    #[test]
    fn test_closed_receiver_is_tolerated() {
        let (tx, rx) = notice_channel();
        drop(rx);
        let indicator = LoadingIndicator::new(tx).with_min_display(Duration::ZERO);

        drop(indicator.begin());
        assert_eq!(indicator.in_flight(), 0);
        assert!(!indicator.is_visible());
    }
}
