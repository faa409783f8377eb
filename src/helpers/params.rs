//! Query parameter maps
//!
//! Request parameters are plain JSON objects. Layers are merged in order,
//! later layers overriding earlier keys.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A flat set of request parameters
pub type Params = Map<String, Value>;

/// Merge parameter layers, later layers winning on key collisions
pub fn merge_params<'a>(layers: impl IntoIterator<Item = &'a Params>) -> Params {
    let mut merged = Params::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Build a [`Params`] map from key/value pairs
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Shared, mutable parameter set
///
/// Cloning the handle shares the underlying map: a filter changed through one
/// clone is observed by every reader on its next [`ParamsHandle::get`].
#[derive(Clone, Debug, Default)]
pub struct ParamsHandle {
    inner: Arc<RwLock<Params>>,
}

impl ParamsHandle {
    /// Create a handle holding `params`
    pub fn new(params: Params) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Snapshot of the current parameters
    pub fn get(&self) -> Params {
        self.inner.read().clone()
    }

    /// Replace all parameters
    pub fn set(&self, params: Params) {
        *self.inner.write() = params;
    }

    /// Insert or overwrite one parameter
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().insert(key.into(), value.into());
    }

    /// Remove one parameter
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }
}

impl From<Params> for ParamsHandle {
    fn from(params: Params) -> Self {
        Self::new(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_later_layer_wins() {
        let base = params([("deptId", json!("01")), ("xm", json!(""))]);
        let search = params([("xm", json!("li"))]);
        let merged = merge_params([&base, &search]);
        assert_eq!(merged.get("deptId"), Some(&json!("01")));
        assert_eq!(merged.get("xm"), Some(&json!("li")));
    }

    #[test]
    fn test_handle_is_shared_between_clones() {
        let handle = ParamsHandle::default();
        let reader = handle.clone();
        handle.insert("status", 1);
        assert_eq!(reader.get().get("status"), Some(&json!(1)));
        handle.remove("status");
        assert!(reader.get().is_empty());
    }
}
