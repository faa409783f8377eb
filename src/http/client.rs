//! HTTP Client
//!
//! JSON REST client for the backend. Injects the session token, unwraps the
//! response envelope, reports failures as notices and drives the global
//! loading indicator.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::helpers::Params;
use crate::http::envelope::{check_envelope, decode_data};
use crate::http::{LoadingGuard, LoadingIndicator, Notice, SessionToken};
use crossbeam_channel::Sender;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Backend HTTP client
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    success_code: String,
    token: SessionToken,
    notices: Option<Sender<Notice>>,
    loading: Option<LoadingIndicator>,
    show_loading: bool,
}

impl HttpClient {
    /// Create a client from the `[api]` configuration
    pub fn new(config: &ApiConfig, token: SessionToken) -> Result<Self> {
        let base_url = normalize_base(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            success_code: config.success_code.clone(),
            token,
            notices: None,
            loading: None,
            show_loading: true,
        })
    }

    /// Publish failures and loading indicator events on `tx`
    pub fn with_notices(mut self, tx: Sender<Notice>) -> Self {
        self.loading = Some(LoadingIndicator::new(tx.clone()));
        self.notices = Some(tx);
        self
    }

    /// A handle whose requests do not show the loading indicator
    ///
    /// Shares the connection pool and the in-flight counter with `self`.
    pub fn without_loading(&self) -> Self {
        Self {
            show_loading: false,
            ..self.clone()
        }
    }

    pub fn loading(&self) -> Option<&LoadingIndicator> {
        self.loading.as_ref()
    }

    fn begin_loading(&self) -> Option<LoadingGuard> {
        self.loading
            .as_ref()
            .filter(|_| self.show_loading)
            .map(LoadingIndicator::begin)
    }

    /// The shared session token
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Resolve a request path against the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Invalid {
                message: format!("Invalid request path '{path}': {e}"),
            })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.token.get() {
            builder = builder.header(AUTHORIZATION, token);
        }
        Ok(builder)
    }

    /// GET returning the checked response body
    pub async fn get_json(&self, path: &str, query: &Params) -> Result<Value> {
        let builder = self.request(Method::GET, path)?.query(&query_pairs(query));
        self.send_json(path, builder).await
    }

    /// POST a JSON body returning the checked response body
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send_json(path, builder).await
    }

    /// PUT a JSON body returning the checked response body
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.send_json(path, builder).await
    }

    /// DELETE returning the checked response body
    pub async fn delete_json(&self, path: &str, query: &Params) -> Result<Value> {
        let builder = self.request(Method::DELETE, path)?.query(&query_pairs(query));
        self.send_json(path, builder).await
    }

    /// GET decoding `data` into `T`
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Params) -> Result<T> {
        decode_data(self.get_json(path, query).await?)
    }

    /// POST decoding `data` into `T`
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        decode_data(self.post_json(path, body).await?)
    }

    /// POST returning raw bytes (file downloads skip the envelope check)
    pub async fn download<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let builder = self.request(Method::POST, path)?.json(body);
        let loading = self.begin_loading();
        let result: Result<Vec<u8>> = async {
            let response = builder.send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
        .await;
        drop(loading);
        self.report(path, result)
    }

    async fn send_json(&self, path: &str, builder: RequestBuilder) -> Result<Value> {
        let loading = self.begin_loading();
        let result: Result<Value> = async {
            let response = builder.send().await?.error_for_status()?;
            let body: Value = response.json().await?;
            check_envelope(body, &self.success_code)
        }
        .await;
        drop(loading);
        self.report(path, result)
    }

    fn report<T>(&self, path: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!("HTTP {path} failed: {e}");
            if let Some(tx) = &self.notices {
                let message = match e {
                    Error::Api { message, .. } => message.clone(),
                    Error::Http { source } if source.is_connect() => {
                        "Network error, please check the connection".to_string()
                    }
                    other => other.to_string(),
                };
                if let Err(e) = tx.send(Notice::danger(message)) {
                    tracing::debug!("HTTP {path} failure notice dropped, receiver gone: {e}");
                }
            }
        }
        result
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("success_code", &self.success_code)
            .field("show_loading", &self.show_loading)
            .finish()
    }
}

/// Ensure the base URL ends with a slash so relative joins keep its path
fn normalize_base(base: &str) -> Result<Url> {
    let with_slash = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&with_slash).map_err(|e| Error::Invalid {
        message: format!("Invalid base URL '{base}': {e}"),
    })
}

/// Flatten params into query pairs; strings are sent bare, nulls are skipped
fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::params;
    use crate::http::NoticeLevel;
    use serde_json::json;

    fn client(base: &str) -> HttpClient {
        let config = ApiConfig {
            base_url: base.to_string(),
            ..Default::default()
        };
        HttpClient::new(&config, SessionToken::new()).expect("client")
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let http = client("https://ops.example.com/api");
        let url = http.url("/personBySfzt/dept/topNodes").expect("url");
        assert_eq!(url.as_str(), "https://ops.example.com/api/personBySfzt/dept/topNodes");
    }

    #[test]
    fn test_invalid_base_rejected() {
        let config = ApiConfig {
            base_url: "::nope".to_string(),
            ..Default::default()
        };
        assert!(HttpClient::new(&config, SessionToken::new()).is_err());
    }

    #[test]
    fn test_query_pairs() {
        let query = params([
            ("xm", json!("wang")),
            ("pageNum", json!(2)),
            ("dwh", Value::Null),
        ]);
        let pairs = query_pairs(&query);
        assert!(pairs.contains(&("xm".to_string(), "wang".to_string())));
        assert!(pairs.contains(&("pageNum".to_string(), "2".to_string())));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_report_publishes_notice() {
        let (tx, rx) = crate::http::notice_channel();
        let http = client("https://ops.example.com").with_notices(tx);
        let result: Result<()> = http.report(
            "/x",
            Err(Error::Api {
                code: "500".into(),
                message: "server busy".into(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(rx.try_recv().expect("notice"), Notice::danger("server busy"));
    }

    #[test]
    fn test_report_survives_closed_receiver() {
        let (tx, rx) = crate::http::notice_channel();
        drop(rx);
        let http = client("https://ops.example.com").with_notices(tx);
        let result: Result<()> = http.report("/x", Err(Error::malformed("no body")));
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_counted_unless_opted_out() {
        let (tx, rx) = crate::http::notice_channel();
        let http = client("https://ops.example.com").with_notices(tx);
        let quiet = http.without_loading();

        assert!(quiet.begin_loading().is_none());
        assert!(rx.try_recv().is_err());

        let guard = http.begin_loading().expect("counted");
        let indicator = quiet.loading().expect("shared indicator");
        assert_eq!(indicator.in_flight(), 1);
        assert_eq!(rx.try_recv().expect("show").level, NoticeLevel::ShowLoading);
        drop(guard);
        assert_eq!(indicator.in_flight(), 0);
    }

    #[test]
    fn test_no_loading_without_notices() {
        let http = client("https://ops.example.com");
        assert!(http.loading().is_none());
        assert!(http.begin_loading().is_none());
    }
}
