//! GET + JSON decode with an explicit outcome instead of a sentinel value.

use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::logging::{log_fetch, log_payload, ProfileScope};

mod retry;
mod source;

pub use retry::{is_retryable_http_error, retry_async, RetryConfig};
pub use source::{HttpSource, RawResponse, ReqwestSource, StaticSource};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum FetchError {
    #[error("response status is not 200: {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
#[error("retryable status {0}")]
struct RetryableStatus(u16);

/// Outcome of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Data(Value),
    /// The server answered with a literal JSON `null`.
    Null,
    /// 200 with an empty body.
    Empty,
    Failed(FetchError),
}

impl Fetched {
    pub fn is_no_data(&self) -> bool {
        !matches!(self, Fetched::Data(_))
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            Fetched::Data(v) => Some(v),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Fetched::Data(_) => "data",
            Fetched::Null => "null",
            Fetched::Empty => "empty",
            Fetched::Failed(FetchError::Status(_)) => "status",
            Fetched::Failed(FetchError::Transport(_)) => "transport",
            Fetched::Failed(FetchError::Malformed(_)) => "malformed",
        }
    }

    /// Collapse to the browser dashboard's convention: anything that is not
    /// truthy data becomes the string `"null"`.
    pub fn legacy_sentinel(&self) -> Value {
        match self {
            Fetched::Data(v) if is_truthy(v) => v.clone(),
            _ => Value::String("null".to_string()),
        }
    }

    fn classify(resp: &RawResponse) -> Self {
        if resp.status != 200 {
            return Fetched::Failed(FetchError::Status(resp.status));
        }
        if resp.body.trim().is_empty() {
            return Fetched::Empty;
        }
        match serde_json::from_str::<Value>(&resp.body) {
            Ok(Value::Null) => Fetched::Null,
            Ok(v) => Fetched::Data(v),
            Err(e) => Fetched::Failed(FetchError::Malformed(e.to_string())),
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn HttpSource>,
    retry: RetryConfig,
}

impl Fetcher {
    pub fn new(source: Arc<dyn HttpSource>, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    pub async fn fetch(&self, url: &str) -> Fetched {
        let scope = ProfileScope::new("fetch");
        let source = &self.source;
        let result = retry_async(&self.retry, url, || async move {
            let resp = source.get(url).await?;
            if is_retryable_http_error(resp.status) {
                return Err(anyhow!(RetryableStatus(resp.status)));
            }
            Ok(resp)
        })
        .await;

        let (status, outcome) = match result {
            Ok(resp) => {
                log_payload(url, resp.body.as_bytes());
                (Some(resp.status), Fetched::classify(&resp))
            }
            Err(e) => match e.downcast_ref::<RetryableStatus>() {
                Some(RetryableStatus(s)) => (Some(*s), Fetched::Failed(FetchError::Status(*s))),
                None => (None, Fetched::Failed(FetchError::Transport(e.to_string()))),
            },
        };
        log_fetch(url, status, outcome.label(), scope.elapsed_ms());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetcher(src: StaticSource) -> Fetcher {
        Fetcher::new(Arc::new(src), RetryConfig::default())
    }

    #[tokio::test]
    async fn test_not_found_is_failure() {
        let out = fetcher(StaticSource::new()).fetch("http://x/missing").await;
        assert_eq!(out, Fetched::Failed(FetchError::Status(404)));
        assert!(out.is_no_data());
        assert_eq!(out.legacy_sentinel(), json!("null"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let src = StaticSource::new().with("http://x/", RawResponse::ok("{not json"));
        let out = fetcher(src).fetch("http://x/").await;
        assert!(matches!(out, Fetched::Failed(FetchError::Malformed(_))));
        assert_eq!(out.legacy_sentinel(), json!("null"));
    }

    #[tokio::test]
    async fn test_null_empty_and_data_are_distinct() {
        let src = StaticSource::new()
            .with("http://x/null", RawResponse::ok("null"))
            .with("http://x/empty", RawResponse::ok("  "))
            .with("http://x/data", RawResponse::ok("{\"a\": 1}"));
        let f = fetcher(src);
        assert_eq!(f.fetch("http://x/null").await, Fetched::Null);
        assert_eq!(f.fetch("http://x/empty").await, Fetched::Empty);
        assert_eq!(f.fetch("http://x/data").await, Fetched::Data(json!({"a": 1})));
        assert_eq!(f.fetch("http://x/data").await.into_data(), Some(json!({"a": 1})));
        assert_eq!(f.fetch("http://x/null").await.into_data(), None);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let src = StaticSource::new().with_error("http://x/", "connection refused");
        let out = fetcher(src).fetch("http://x/").await;
        assert!(matches!(out, Fetched::Failed(FetchError::Transport(ref m)) if m.contains("refused")));
    }

    #[tokio::test]
    async fn test_retryable_status_is_retried() {
        let src = Arc::new(StaticSource::new().with("http://x/", RawResponse::status(503)));
        let f = Fetcher::new(
            src.clone(),
            RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
                max_delay_ms: 2,
                jitter_factor: 0.0,
            },
        );
        assert_eq!(f.fetch("http://x/").await, Fetched::Failed(FetchError::Status(503)));
        assert_eq!(src.hits(), 3);
    }

    #[test]
    fn test_legacy_sentinel_falsy_values() {
        assert_eq!(Fetched::Data(json!(0)).legacy_sentinel(), json!("null"));
        assert_eq!(Fetched::Data(json!(1.5)).legacy_sentinel(), json!(1.5));
        assert_eq!(Fetched::Null.legacy_sentinel(), json!("null"));
    }
}
