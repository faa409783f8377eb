//! RefreshList - Paginated Data Source
//!
//! Drives a pull-to-refresh + infinite-scroll list from a paged endpoint.
//!
//! ## Triggers
//!
//! ```text
//! load_more ──┐                      ┌── append (page > 1)
//! refresh ────┼── PageFetcher ── Page┤
//! search ─────┘                      └── replace (page 1)
//! ```
//!
//! Failures never reach the caller: the list marks itself errored and
//! exhausted so scroll triggers stop, and the view offers a refresh.

use crate::constants::{DEFAULT_PAGE_SIZE, PAGE_NUM_KEY, PAGE_SIZE_KEY};
use crate::helpers::{Params, ParamsHandle, merge_params};
use crate::list::page::{Page, PageFetcher};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// What a list operation did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page arrived and was applied
    Loaded { count: usize },
    /// Not started: a fetch is in flight or the list is exhausted
    Skipped,
    /// Finished after a refresh/search/reset restarted the list; discarded
    Superseded,
    /// The fetch failed; the list is now errored and exhausted
    Failed,
}

/// Point-in-time view of the list status
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListSnapshot {
    /// Next page to request
    pub page_number: u32,
    pub page_size: u32,
    /// Last total reported by the server
    pub total_count: u64,
    /// Items accumulated so far
    pub len: usize,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    pub is_exhausted: bool,
    pub has_error: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    LoadMore,
    Refresh,
}

struct PendingFetch {
    generation: u64,
    page_number: u32,
    trigger: Trigger,
    params: Params,
}

struct ListInner<T> {
    items: Vec<T>,
    page_number: u32,
    page_size: u32,
    total_count: u64,
    search_params: Params,
    is_refreshing: bool,
    is_loading_more: bool,
    is_exhausted: bool,
    has_error: bool,
    /// Bumped on every restart; responses from older generations are dropped
    generation: u64,
}

impl<T> ListInner<T> {
    fn in_flight(&self) -> bool {
        self.is_refreshing || self.is_loading_more
    }

    fn restart(&mut self) {
        self.generation += 1;
        self.page_number = 1;
        self.items.clear();
        self.is_exhausted = false;
        self.has_error = false;
        self.is_refreshing = false;
        self.is_loading_more = false;
    }

    fn begin(&mut self, trigger: Trigger, extra: &ParamsHandle) -> PendingFetch {
        match trigger {
            Trigger::LoadMore => self.is_loading_more = true,
            Trigger::Refresh => self.is_refreshing = true,
        }

        let paging: Params = [
            (PAGE_NUM_KEY.to_string(), Value::from(self.page_number)),
            (PAGE_SIZE_KEY.to_string(), Value::from(self.page_size)),
        ]
        .into_iter()
        .collect();
        let extra = extra.get();

        PendingFetch {
            generation: self.generation,
            page_number: self.page_number,
            trigger,
            params: merge_params([&extra, &self.search_params, &paging]),
        }
    }

    fn clear_flag(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::LoadMore => self.is_loading_more = false,
            Trigger::Refresh => self.is_refreshing = false,
        }
    }

    fn apply(&mut self, page: Page<T>, page_number: u32) {
        let returned = page.records.len() as u64;
        let page_size = u64::from(self.page_size);

        self.total_count = page.total;
        self.is_exhausted =
            returned < page_size || u64::from(page_number) * page_size >= page.total;

        if page_number == 1 {
            self.items = page.records;
        } else {
            self.items.extend(page.records);
        }

        self.page_number = page_number + 1;
        self.has_error = false;
    }
}

/// Paginated list engine
pub struct RefreshList<T> {
    fetcher: Box<dyn PageFetcher>,
    extra_params: ParamsHandle,
    inner: Mutex<ListInner<T>>,
}

impl<T> RefreshList<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create a list over `fetcher` with the default page size
    pub fn new(fetcher: impl PageFetcher) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            extra_params: ParamsHandle::default(),
            inner: Mutex::new(ListInner {
                items: Vec::new(),
                page_number: 1,
                page_size: DEFAULT_PAGE_SIZE,
                total_count: 0,
                search_params: Params::new(),
                is_refreshing: false,
                is_loading_more: false,
                is_exhausted: false,
                has_error: false,
                generation: 0,
            }),
        }
    }

    /// Set the page size (values below 1 are raised to 1)
    pub fn with_page_size(self, page_size: u32) -> Self {
        self.inner.lock().page_size = page_size.max(1);
        self
    }

    /// Use `extra` as the static filter layer
    ///
    /// Passing a [`ParamsHandle`] keeps the filters live: changes made through
    /// any clone of the handle apply from the next fetch on.
    pub fn with_extra_params(mut self, extra: impl Into<ParamsHandle>) -> Self {
        self.extra_params = extra.into();
        self
    }

    /// Live handle to the static filter layer
    pub fn extra_params(&self) -> &ParamsHandle {
        &self.extra_params
    }

    /// Fetch the next page and append it
    ///
    /// No-op while any fetch is in flight or once the list is exhausted.
    pub async fn load_more(&self) -> FetchOutcome {
        let pending = {
            let mut inner = self.inner.lock();
            if inner.in_flight() || inner.is_exhausted {
                return FetchOutcome::Skipped;
            }
            inner.begin(Trigger::LoadMore, &self.extra_params)
        };
        self.execute(pending).await
    }

    /// Restart from page 1, replacing the items
    ///
    /// Supersedes an in-flight `load_more`; a second refresh while one is
    /// pending is dropped.
    pub async fn refresh(&self) -> FetchOutcome {
        let pending = {
            let mut inner = self.inner.lock();
            if inner.is_refreshing {
                return FetchOutcome::Skipped;
            }
            inner.restart();
            inner.begin(Trigger::Refresh, &self.extra_params)
        };
        self.execute(pending).await
    }

    /// Replace the search fields and load page 1
    ///
    /// Static extra params are kept.
    pub async fn search(&self, search_params: Params) -> FetchOutcome {
        let pending = {
            let mut inner = self.inner.lock();
            inner.search_params = search_params;
            inner.restart();
            inner.begin(Trigger::LoadMore, &self.extra_params)
        };
        self.execute(pending).await
    }

    /// Clear the search fields and load page 1
    pub async fn reset(&self) -> FetchOutcome {
        self.search(Params::new()).await
    }

    async fn execute(&self, pending: PendingFetch) -> FetchOutcome {
        let mut guard = InFlightGuard {
            inner: &self.inner,
            generation: pending.generation,
            trigger: pending.trigger,
            armed: true,
        };

        let result = match self.fetcher.fetch(pending.params).await {
            Ok(body) => Page::<T>::from_response(body),
            Err(e) => Err(e),
        };

        guard.armed = false;
        let mut inner = self.inner.lock();

        if inner.generation != pending.generation {
            tracing::debug!("Discarding superseded page {}", pending.page_number);
            return FetchOutcome::Superseded;
        }

        inner.clear_flag(pending.trigger);

        match result {
            Ok(page) => {
                let count = page.records.len();
                inner.apply(page, pending.page_number);
                FetchOutcome::Loaded { count }
            }
            Err(e) => {
                tracing::error!("Page {} fetch failed: {}", pending.page_number, e);
                inner.is_exhausted = true;
                inner.has_error = true;
                FetchOutcome::Failed
            }
        }
    }

    /// Current status
    pub fn snapshot(&self) -> ListSnapshot {
        let inner = self.inner.lock();
        ListSnapshot {
            page_number: inner.page_number,
            page_size: inner.page_size,
            total_count: inner.total_count,
            len: inner.items.len(),
            is_refreshing: inner.is_refreshing,
            is_loading_more: inner.is_loading_more,
            is_exhausted: inner.is_exhausted,
            has_error: inner.has_error,
        }
    }

    /// Current search fields
    pub fn search_params(&self) -> Params {
        self.inner.lock().search_params.clone()
    }

    /// Number of accumulated items
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the items for the duration of `f`
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.lock().items)
    }

    /// Mutate the items in place (e.g. toggling selection marks)
    pub fn update_items(&self, f: impl FnOnce(&mut [T])) {
        f(&mut self.inner.lock().items)
    }

    /// Clone of the accumulated items
    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.inner.lock().items.clone()
    }
}

/// Clears the in-flight flag if the fetch future is dropped before finishing
struct InFlightGuard<'a, T> {
    inner: &'a Mutex<ListInner<T>>,
    generation: u64,
    trigger: Trigger,
    armed: bool,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.generation == self.generation {
            inner.clear_flag(self.trigger);
        }
    }
}

impl<T> std::fmt::Debug for RefreshList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RefreshList")
            .field("page_number", &inner.page_number)
            .field("page_size", &inner.page_size)
            .field("total_count", &inner.total_count)
            .field("len", &inner.items.len())
            .field("is_exhausted", &inner.is_exhausted)
            .field("has_error", &inner.has_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::helpers::params;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    /// Replays scripted bodies and records every request
    #[derive(Clone, Default)]
    struct Scripted {
        replies: Arc<Mutex<VecDeque<Result<Value>>>>,
        calls: Arc<Mutex<Vec<Params>>>,
        delay: Duration,
    }

    impl Scripted {
        fn new(replies: Vec<Result<Value>>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Default::default()
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Vec<Params> {
            self.calls.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for Scripted {
        async fn fetch(&self, params: Params) -> Result<Value> {
            self.calls.lock().push(params);
            let reply = self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(Error::invalid("no scripted reply")));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            reply
        }
    }

    fn page(start: u32, count: u32, total: u64) -> Result<Value> {
        let records: Vec<u32> = (start..start + count).collect();
        Ok(json!({"code": 200, "data": {"records": records, "total": total}}))
    }

    #[tokio::test]
    async fn test_load_more_accumulates() {
        let fetcher = Scripted::new(vec![page(0, 10, 100), page(10, 10, 100), page(20, 10, 100)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone());

        for expected_page in 1..=3u32 {
            let before = list.len();
            assert_eq!(list.load_more().await, FetchOutcome::Loaded { count: 10 });
            assert_eq!(list.len(), before + 10);
            assert_eq!(list.snapshot().page_number, expected_page + 1);
        }

        let pages: Vec<Value> = fetcher.calls().iter().map(|p| p[PAGE_NUM_KEY].clone()).collect();
        assert_eq!(pages, vec![json!(1), json!(2), json!(3)]);
        assert!(!list.snapshot().is_exhausted);
    }

    #[tokio::test]
    async fn test_exhausted_by_short_page() {
        let fetcher = Scripted::new(vec![page(0, 20, 45), page(20, 20, 45), page(40, 5, 45)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher).with_page_size(20);

        list.load_more().await;
        list.load_more().await;
        assert!(!list.snapshot().is_exhausted);
        list.load_more().await;

        let snapshot = list.snapshot();
        assert!(snapshot.is_exhausted);
        assert_eq!(snapshot.len, 45);
        assert_eq!(snapshot.total_count, 45);
    }

    #[tokio::test]
    async fn test_exhausted_on_exact_boundary() {
        let fetcher = Scripted::new(vec![page(0, 20, 40), page(20, 20, 40)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone()).with_page_size(20);

        list.load_more().await;
        assert!(!list.snapshot().is_exhausted);
        list.load_more().await;
        assert!(list.snapshot().is_exhausted);

        // Exhausted lists ignore further scroll triggers
        assert_eq!(list.load_more().await, FetchOutcome::Skipped);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_load_more_fetches_once() {
        let fetcher =
            Scripted::new(vec![page(0, 10, 100), page(10, 10, 100)]).delayed(Duration::from_millis(50));
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone());

        let (first, second) = tokio::join!(list.load_more(), list.load_more());

        assert_eq!(first, FetchOutcome::Loaded { count: 10 });
        assert_eq!(second, FetchOutcome::Skipped);
        assert_eq!(fetcher.calls().len(), 1);
        assert_eq!(list.snapshot().page_number, 2);
    }

    #[tokio::test]
    async fn test_search_resets_and_keeps_extra_params() {
        let fetcher = Scripted::new(vec![
            page(0, 10, 100),
            page(10, 10, 100),
            page(20, 10, 100),
            page(0, 3, 3),
        ]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone())
            .with_extra_params(params([("deptId", json!("D01"))]));

        for _ in 0..3 {
            list.load_more().await;
        }
        assert_eq!(list.snapshot().page_number, 4);

        let outcome = list.search(params([("xm", json!("a"))])).await;
        assert_eq!(outcome, FetchOutcome::Loaded { count: 3 });

        let snapshot = list.snapshot();
        assert_eq!(snapshot.page_number, 2);
        assert_eq!(snapshot.len, 3);
        assert_eq!(list.items(), vec![0, 1, 2]);

        let last = fetcher.calls().pop().expect("search request");
        assert_eq!(last.get("xm"), Some(&json!("a")));
        assert_eq!(last.get("deptId"), Some(&json!("D01")));
        assert_eq!(last.get(PAGE_NUM_KEY), Some(&json!(1)));
        assert_eq!(last.get(PAGE_SIZE_KEY), Some(&json!(DEFAULT_PAGE_SIZE)));
    }

    #[tokio::test]
    async fn test_reset_clears_search_only() {
        let fetcher = Scripted::new(vec![page(0, 2, 2), page(0, 5, 5)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone())
            .with_extra_params(params([("status", json!(1))]));

        list.search(params([("xm", json!("zhang"))])).await;
        list.reset().await;

        assert!(list.search_params().is_empty());
        let last = fetcher.calls().pop().expect("reset request");
        assert!(last.get("xm").is_none());
        assert_eq!(last.get("status"), Some(&json!(1)));
        assert_eq!(list.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_marks_error_and_exhausted() {
        let fetcher = Scripted::new(vec![
            page(0, 10, 30),
            Err(Error::Api {
                code: "500".into(),
                message: "boom".into(),
            }),
            page(0, 10, 30),
        ]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone());

        list.load_more().await;
        assert_eq!(list.load_more().await, FetchOutcome::Failed);

        let snapshot = list.snapshot();
        assert!(snapshot.has_error);
        assert!(snapshot.is_exhausted);
        assert!(!snapshot.is_loading_more);
        // Page number only moves on success; items survive the failure
        assert_eq!(snapshot.page_number, 2);
        assert_eq!(snapshot.len, 10);

        assert_eq!(list.load_more().await, FetchOutcome::Skipped);

        assert_eq!(list.refresh().await, FetchOutcome::Loaded { count: 10 });
        let snapshot = list.snapshot();
        assert!(!snapshot.has_error);
        assert!(!snapshot.is_exhausted);
        assert!(!snapshot.is_refreshing);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_body_treated_as_failure() {
        let fetcher = Scripted::new(vec![Ok(json!({"code": 200, "data": {"list": []}}))]);
        let list: RefreshList<u32> = RefreshList::new(fetcher);

        assert_eq!(list.load_more().await, FetchOutcome::Failed);
        assert!(list.snapshot().has_error);
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_items() {
        let fetcher = Scripted::new(vec![page(0, 10, 50), page(10, 10, 50), page(100, 10, 50)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher);

        list.load_more().await;
        list.load_more().await;
        assert_eq!(list.len(), 20);

        list.refresh().await;
        assert_eq!(list.len(), 10);
        assert_eq!(list.with_items(|items| items[0]), 100);
        assert_eq!(list.snapshot().page_number, 2);
    }

    #[tokio::test]
    async fn test_extra_params_change_is_picked_up() {
        let fetcher = Scripted::new(vec![page(0, 10, 100), page(10, 10, 100)]);
        let list: RefreshList<u32> = RefreshList::new(fetcher.clone());

        list.load_more().await;
        list.extra_params().insert("areaId", "A7");
        list.load_more().await;

        let calls = fetcher.calls();
        assert!(calls[0].get("areaId").is_none());
        assert_eq!(calls[1].get("areaId"), Some(&json!("A7")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_supersedes_in_flight_load() {
        let fetcher = Scripted::new(vec![page(500, 10, 100), page(0, 10, 100)])
            .delayed(Duration::from_millis(50));
        let list: RefreshList<u32> = RefreshList::new(fetcher);

        let (stale, fresh) = tokio::join!(list.load_more(), list.refresh());

        assert_eq!(stale, FetchOutcome::Superseded);
        assert_eq!(fresh, FetchOutcome::Loaded { count: 10 });
        assert_eq!(list.with_items(|items| items[0]), 0);
        let snapshot = list.snapshot();
        assert!(!snapshot.is_loading_more && !snapshot.is_refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_fetch_releases_flag() {
        let fetcher = Scripted::new(vec![page(0, 10, 100), page(0, 10, 100)])
            .delayed(Duration::from_millis(100));
        let list: RefreshList<u32> = RefreshList::new(fetcher);

        let abandoned = tokio::time::timeout(Duration::from_millis(10), list.load_more()).await;
        assert!(abandoned.is_err());
        assert!(!list.snapshot().is_loading_more);

        assert_eq!(list.load_more().await, FetchOutcome::Loaded { count: 10 });
    }
}
