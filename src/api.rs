//! Endpoint catalogue of the prediction API.

use std::sync::Arc;

use anyhow::Result;
use futures_util::future::join_all;
use serde_json::Value;

use crate::config::Config;
use crate::fetch::{Fetcher, HttpSource, ReqwestSource};
use crate::model::{
    decode_budgets, decode_chart, decode_current_value, decode_lagged, decode_leaderboard, decode_prizes, ChartSeries,
    LaggedPoint, LeaderboardEntry, PrizeEntry, Section,
};
use crate::stream::StreamId;

#[derive(Clone)]
pub struct ApiClient {
    cfg: Arc<Config>,
    fetcher: Fetcher,
}

impl ApiClient {
    pub fn new(cfg: Config, source: Arc<dyn HttpSource>) -> Self {
        let fetcher = Fetcher::new(source, cfg.retry());
        Self {
            cfg: Arc::new(cfg),
            fetcher,
        }
    }

    /// Client backed by a real HTTP connection pool.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let source = ReqwestSource::new(&cfg)?;
        Ok(Self::new(cfg, Arc::new(source)))
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn leaderboard_url(&self, id: &StreamId) -> String {
        format!("{}leaderboards/{}", self.cfg.api_base, id.request_key())
    }

    pub fn live_url(&self, id: &StreamId) -> String {
        format!("{}live/{}", self.cfg.api_base, id.request_key())
    }

    pub fn lagged_url(&self, id: &StreamId) -> String {
        format!("{}lagged/{}", self.cfg.api_base, id.lagged_key())
    }

    pub fn prizes_url(&self) -> String {
        format!("{}prizes/", self.cfg.api_base)
    }

    pub fn budgets_url(&self) -> String {
        format!("{}budgets/", self.cfg.api_base)
    }

    pub fn sponsor_url(&self, code: &str) -> String {
        format!("{}{}", self.cfg.animal_base, code)
    }

    pub fn chart_url(&self, id: &StreamId) -> String {
        format!("{}bar?name={}&json=True", self.cfg.plots_base, id.lagged_key())
    }

    pub async fn leaderboard(&self, id: &StreamId) -> Section<Vec<LeaderboardEntry>> {
        Section::from_fetched(self.fetcher.fetch(&self.leaderboard_url(id)).await, decode_leaderboard)
    }

    pub async fn current_value(&self, id: &StreamId) -> Section<f64> {
        Section::from_fetched(self.fetcher.fetch(&self.live_url(id)).await, decode_current_value)
    }

    pub async fn lagged(&self, id: &StreamId) -> Section<Vec<LaggedPoint>> {
        let limit = self.cfg.lagged_limit;
        Section::from_fetched(self.fetcher.fetch(&self.lagged_url(id)).await, |v| decode_lagged(v, limit))
    }

    pub async fn chart(&self, id: &StreamId) -> Section<ChartSeries> {
        Section::from_fetched(self.fetcher.fetch(&self.chart_url(id)).await, decode_chart)
    }

    pub async fn budgets(&self) -> Section<Vec<(String, f64)>> {
        Section::from_fetched(self.fetcher.fetch(&self.budgets_url()).await, decode_budgets)
    }

    /// Prize table with sponsor names resolved concurrently. A failed
    /// lookup leaves the sponsor unresolved rather than failing the table.
    pub async fn prizes(&self) -> Section<Vec<PrizeEntry>> {
        let mut entries = match Section::from_fetched(self.fetcher.fetch(&self.prizes_url()).await, decode_prizes) {
            Section::Ready(entries) => entries,
            other => return other,
        };
        let lookups = entries.iter().map(|e| self.sponsor_name(e.sponsor_code()));
        let names = join_all(lookups).await;
        for (entry, name) in entries.iter_mut().zip(names) {
            entry.sponsor = name;
        }
        Section::Ready(entries)
    }

    async fn sponsor_name(&self, code: &str) -> Option<String> {
        match self.fetcher.fetch(&self.sponsor_url(code)).await.into_data()? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Object(m) => m.get("name").and_then(|n| n.as_str()).map(str::to_string),
            _ => None,
        }
    }
}
