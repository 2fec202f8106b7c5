use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;

/// Status and body of a completed GET, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Transport errors only; any HTTP status is a successful response here.
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

pub struct ReqwestSource {
    client: Client,
}

impl ReqwestSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Canned responses keyed by url. Unknown urls answer 404.
#[derive(Default)]
pub struct StaticSource {
    routes: Mutex<HashMap<String, std::result::Result<RawResponse, String>>>,
    hits: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: impl Into<String>, resp: RawResponse) -> Self {
        self.insert(url, Ok(resp));
        self
    }

    pub fn with_json(self, url: impl Into<String>, body: &serde_json::Value) -> Self {
        self.with(url, RawResponse::ok(body.to_string()))
    }

    pub fn with_error(self, url: impl Into<String>, err: impl Into<String>) -> Self {
        self.insert(url, Err(err.into()));
        self
    }

    fn insert(&self, url: impl Into<String>, resp: std::result::Result<RawResponse, String>) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(url.into(), resp);
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpSource for StaticSource {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let routes = self
            .routes
            .lock()
            .map_err(|_| anyhow!("static source lock poisoned"))?;
        match routes.get(url) {
            Some(Ok(resp)) => Ok(resp.clone()),
            Some(Err(e)) => Err(anyhow!("{}", e)),
            None => Ok(RawResponse::status(404)),
        }
    }
}
