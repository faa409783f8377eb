use fieldops::api::Personnel;
use fieldops::error::Error;
use fieldops::helpers::{Params, ParamsHandle, params};
use fieldops::list::{FetchOutcome, RefreshList};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;

const TOTAL: u64 = 45;

/// Serves `TOTAL` personnel records in pages and records every request
fn personnel_server(requests: Arc<Mutex<Vec<Params>>>) -> impl Fn(Params) -> std::future::Ready<fieldops::error::Result<Value>> {
    move |query: Params| {
        requests.lock().push(query.clone());
        let page = query.get("pageNum").and_then(Value::as_u64).unwrap_or(1);
        let size = query.get("pageSize").and_then(Value::as_u64).unwrap_or(10);

        let start = (page - 1) * size;
        let end = (start + size).min(TOTAL);
        let records: Vec<Value> = (start..end)
            .map(|i| json!({"id": format!("u{i}"), "xgh": format!("{i:05}"), "xm": format!("Person {i}")}))
            .collect();
        std::future::ready(Ok(json!({"code": 200, "data": {"records": records, "total": TOTAL}})))
    }
}

#[tokio::test]
async fn test_scroll_to_end_then_refresh() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let list: RefreshList<Personnel> =
        RefreshList::new(personnel_server(requests.clone())).with_page_size(20);

    assert_eq!(list.load_more().await, FetchOutcome::Loaded { count: 20 });
    assert_eq!(list.load_more().await, FetchOutcome::Loaded { count: 20 });
    assert!(!list.snapshot().is_exhausted);
    assert_eq!(list.load_more().await, FetchOutcome::Loaded { count: 5 });

    let snapshot = list.snapshot();
    assert_eq!(snapshot.len, 45);
    assert_eq!(snapshot.total_count, 45);
    assert!(snapshot.is_exhausted);
    assert!(!snapshot.has_error);

    // Exhausted: scrolling further does not hit the server
    assert_eq!(list.load_more().await, FetchOutcome::Skipped);
    assert_eq!(requests.lock().len(), 3);

    assert_eq!(list.refresh().await, FetchOutcome::Loaded { count: 20 });
    assert_eq!(list.len(), 20);
    assert_eq!(list.items()[0].xgh, "00000");
    assert!(!list.snapshot().is_exhausted);

    let pages: Vec<u64> = requests
        .lock()
        .iter()
        .filter_map(|q| q.get("pageNum").and_then(Value::as_u64))
        .collect();
    assert_eq!(pages, vec![1, 2, 3, 1]);
}

#[tokio::test]
async fn test_search_merges_filters() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let filters = ParamsHandle::new(params([("dwh", "01")]));
    let list: RefreshList<Personnel> = RefreshList::new(personnel_server(requests.clone()))
        .with_extra_params(filters.clone());

    list.load_more().await;
    list.search(params([("xm", "Li")])).await;
    filters.insert("dwh", "02");
    list.load_more().await;

    let requests = requests.lock();
    assert_eq!(requests[1].get("xm"), Some(&json!("Li")));
    assert_eq!(requests[1].get("pageNum"), Some(&json!(1)));
    assert_eq!(requests[2].get("dwh"), Some(&json!("02")));
    assert_eq!(requests[2].get("xm"), Some(&json!("Li")));
    assert_eq!(requests[2].get("pageNum"), Some(&json!(2)));
}

#[tokio::test]
async fn test_failure_stops_scrolling_until_refresh() {
    let healthy = Arc::new(Mutex::new(false));
    let flag = healthy.clone();
    let list: RefreshList<Personnel> = RefreshList::new(move |_query: Params| {
        let ok = *flag.lock();
        async move {
            if ok {
                Ok(json!({"data": {"records": [{"id": "u1", "xgh": "1", "xm": "A"}], "total": 1}}))
            } else {
                Err(Error::Api {
                    code: "500".to_string(),
                    message: "server busy".to_string(),
                })
            }
        }
    });

    assert_eq!(list.load_more().await, FetchOutcome::Failed);
    let snapshot = list.snapshot();
    assert!(snapshot.has_error && snapshot.is_exhausted);
    assert_eq!(list.load_more().await, FetchOutcome::Skipped);

    *healthy.lock() = true;
    assert_eq!(list.refresh().await, FetchOutcome::Loaded { count: 1 });
    assert!(!list.snapshot().has_error);
}
