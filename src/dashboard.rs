//! One dashboard load: resolve the request context, fetch every section
//! concurrently, and assemble a view.

use std::sync::Arc;

use serde::Serialize;

use crate::api::ApiClient;
use crate::logging::{log_listing, log_section, v_str, ProfileScope};
use crate::model::{ChartSeries, LaggedPoint, LeaderboardEntry, PrizeEntry, Section};
use crate::stream::{chooser_streams, compose_selection, horizon_buttons, links, CodecError, Delays, HorizonButton, NavTarget, StreamId};

/// State of the three stream choosers plus the horizon from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
    pub horizon: Option<String>,
    /// Set when the user changed a chooser since the previous load.
    pub changed: bool,
}

impl Selection {
    pub fn from_stream(stream: impl Into<String>) -> Self {
        Self {
            primary: stream.into(),
            ..Default::default()
        }
    }

    /// Choosing a new primary stream clears the other two filters.
    pub fn choose_primary(&mut self, primary: impl Into<String>) {
        self.primary = primary.into();
        self.secondary.clear();
        self.tertiary.clear();
        self.changed = true;
    }

    pub fn choose_filters(&mut self, secondary: impl Into<String>, tertiary: impl Into<String>) {
        self.secondary = secondary.into();
        self.tertiary = tertiary.into();
        self.changed = true;
    }

    pub fn stream_name(&self) -> String {
        compose_selection(&self.primary, &self.secondary, &self.tertiary)
    }

    pub fn to_query(&self) -> String {
        let mut q = url::form_urlencoded::Serializer::new(String::new());
        q.append_pair("stream", &self.stream_name());
        if let Some(h) = &self.horizon {
            q.append_pair("horizon", h);
        }
        q.finish()
    }
}

/// Everything one load needs, fixed before the first request goes out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub id: StreamId,
    pub delays: Delays,
    pub request_key: String,
    pub lagged_key: String,
    pub filters_changed: bool,
}

impl RequestContext {
    pub fn new(id: StreamId, delays: Delays, filters_changed: bool) -> Self {
        Self {
            request_key: id.request_key(),
            lagged_key: id.lagged_key(),
            id,
            delays,
            filters_changed,
        }
    }

    pub fn from_selection(sel: &Selection, delays: &Delays) -> Result<Arc<Self>, CodecError> {
        let id = StreamId::parse_query(&sel.to_query(), delays)?;
        Ok(Arc::new(Self::new(id, delays.clone(), sel.changed)))
    }

    pub fn from_query(raw: &str, delays: &Delays) -> Result<Arc<Self>, CodecError> {
        let id = StreamId::parse_query(raw, delays)?;
        Ok(Arc::new(Self::new(id, delays.clone(), false)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Cdf { series: Section<ChartSeries> },
    Bar { series: Section<ChartSeries>, refresh: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub ctx: Arc<RequestContext>,
    pub leaderboard: Section<Vec<LeaderboardEntry>>,
    pub current_value: Section<f64>,
    pub lagged: Section<Vec<LaggedPoint>>,
    pub horizons: Vec<HorizonButton>,
    pub nav: Vec<NavTarget>,
    pub chart: Chart,
}

impl DashboardView {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

#[derive(Clone)]
pub struct DashboardController {
    api: ApiClient,
}

impl DashboardController {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn load(&self, ctx: Arc<RequestContext>) -> DashboardView {
        let stream = ctx.id.to_string();
        let _scope = ProfileScope::with_context("dashboard_load", &[("stream", v_str(&stream))]);

        let (leaderboard, current_value, lagged, series) = tokio::join!(
            self.api.leaderboard(&ctx.id),
            self.api.current_value(&ctx.id),
            self.api.lagged(&ctx.id),
            self.api.chart(&ctx.id),
        );

        log_section(&stream, "leaderboard", leaderboard.state());
        log_section(&stream, "current_value", current_value.state());
        log_section(&stream, "lagged", lagged.state());
        log_section(&stream, "chart", series.state());

        let chart = if ctx.id.horizon.is_some() {
            Chart::Cdf { series }
        } else {
            Chart::Bar {
                series,
                refresh: ctx.filters_changed,
            }
        };

        DashboardView {
            horizons: horizon_buttons(&ctx.id, &ctx.delays),
            nav: links(&ctx.id, &ctx.delays),
            leaderboard,
            current_value,
            lagged,
            chart,
            ctx,
        }
    }

    /// Plain stream names for the chooser, from the budgets dictionary.
    pub async fn stream_list(&self) -> Section<Vec<String>> {
        match self.api.budgets().await {
            Section::Ready(pairs) => {
                let names = chooser_streams(pairs.iter().map(|(k, _)| k.as_str()), &self.api.config().delays);
                if names.is_empty() {
                    Section::NoData
                } else {
                    Section::Ready(names)
                }
            }
            Section::NoData => Section::NoData,
            Section::Failed(e) => Section::Failed(e),
        }
    }

    /// Dashboard links for every listed stream.
    pub async fn stream_links(&self) -> Section<Vec<NavTarget>> {
        let delays = &self.api.config().delays;
        let links = self.stream_list().await.map(|names| {
            names
                .iter()
                .filter_map(|name| StreamId::from_display_name(name, delays).ok())
                .map(|id| NavTarget::dashboard(&id))
                .collect()
        });
        log_listing("streams", links.state());
        links
    }

    pub async fn prizes(&self) -> Section<Vec<PrizeEntry>> {
        let prizes = self.api.prizes().await;
        log_listing("prizes", prizes.state());
        prizes
    }
}
