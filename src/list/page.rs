//! Page decoding and the fetch seam
//!
//! A paged endpoint answers `{data: {records: [...], total: n}}`; some older
//! endpoints name the total `totalRow`.

use crate::error::{Error, Result};
use crate::helpers::Params;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;

/// Source of raw page responses
///
/// Receives the merged request parameters (filters, search fields,
/// `pageNum`, `pageSize`) and returns the response body untouched.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    async fn fetch(&self, params: Params) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> PageFetcher for F
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn fetch(&self, params: Params) -> Result<Value> {
        (self)(params).await
    }
}

/// One decoded page
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a response body
    ///
    /// Any missing piece (`data`, `records`, total) is an error; nothing is
    /// defaulted.
    pub fn from_response(body: Value) -> Result<Self> {
        let Value::Object(mut body) = body else {
            return Err(Error::malformed("page response is not an object"));
        };

        let Some(Value::Object(mut data)) = body.remove("data") else {
            return Err(Error::malformed("page response has no data object"));
        };

        let records = match data.remove("records") {
            Some(records @ Value::Array(_)) => serde_json::from_value::<Vec<T>>(records)?,
            Some(_) => return Err(Error::malformed("page records is not an array")),
            None => return Err(Error::malformed("page response has no records")),
        };

        let total = data
            .get("total")
            .or_else(|| data.get("totalRow"))
            .and_then(as_count)
            .ok_or_else(|| Error::malformed("page response has no usable total"))?;

        Ok(Self { records, total })
    }
}

/// Accept non-negative integers, including numeric strings
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
