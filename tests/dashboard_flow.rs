//! End-to-end dashboard loads against canned endpoint responses.

use std::sync::Arc;

use serde_json::{json, Value};
use streamdash::api::ApiClient;
use streamdash::config::Config;
use streamdash::dashboard::{Chart, DashboardController, RequestContext, Selection};
use streamdash::fetch::{FetchError, RawResponse, StaticSource};
use streamdash::model::Section;
use streamdash::render::{self, MAX_LAGGED_ROWS, NO_LAGGED, NO_LEADERBOARD};
use streamdash::stream::{Delays, NavKind, StreamId};

const BASE: &str = "http://api.test/";

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn controller(src: StaticSource) -> DashboardController {
    DashboardController::new(ApiClient::new(Config::for_base(BASE), Arc::new(src)))
}

fn lagged_rows(n: i64) -> Value {
    Value::Array((0..n).map(|i| json!([1_600_000_000 + i * 60, 10.0 + i as f64])).collect())
}

/// Trimmed header cells of the first table line starting with `first`.
fn header_cells(text: &str, first: &str) -> Vec<String> {
    text.lines()
        .find(|l| l.starts_with(first))
        .unwrap_or_default()
        .split('|')
        .map(|c| c.trim().to_string())
        .collect()
}

fn chart() -> Value {
    json!({"data": [{"type": "bar", "x": [1, 2, 3], "y": [0.25, 0.5, 0.25]}]})
}

#[tokio::test]
async fn plain_stream_loads_every_section() {
    let src = StaticSource::new()
        .with_json(url("leaderboards/bart_delays.json"), &json!({"Flashy Coyote": 12.5, "Boozy Cat": -3.25}))
        .with_json(url("live/bart_delays.json"), &json!(4.123456))
        .with_json(url("lagged/bart_delays.json"), &lagged_rows(3))
        .with_json(url("bar?name=bart_delays.json&json=True"), &chart());
    let ctx = RequestContext::from_query("stream=bart_delays", &Delays::default()).unwrap();
    let view = controller(src).load(ctx).await;

    let lb = view.leaderboard.ready().unwrap();
    assert_eq!(lb[0].participant_id, "Flashy Coyote");
    assert_eq!(lb[1].rank, 2);
    assert_eq!(view.current_value, Section::Ready(4.123456));
    assert_eq!(view.lagged.ready().unwrap().len(), 3);
    assert!(view.horizons.is_empty());
    assert!(matches!(view.chart, Chart::Bar { refresh: false, ref series } if series.ready().is_some()));
    assert!(view.nav.iter().any(|t| t.kind == NavKind::GoToZ1));

    let text = render::render_dashboard(&view, 20);
    assert!(text.contains("Rank | MUID          | Points"));
    assert!(text.contains("+12.5"));
    assert!(text.contains("-3.25"));
    assert!(text.contains("Current value: 4.12346"));
    assert_eq!(header_cells(&text, "Timestamp"), vec!["Timestamp", "Data"]);
}

#[tokio::test]
async fn horizon_selects_cdf_and_prefixed_keys() {
    let src = StaticSource::new()
        .with_json(url("leaderboards/310::bart_delays.json"), &json!({"a": 1}))
        .with_json(url("live/310::bart_delays.json"), &json!("7.5"))
        .with_json(url("lagged/bart_delays.json"), &lagged_rows(2))
        .with_json(url("bar?name=bart_delays.json&json=True"), &chart());
    let src = Arc::new(src);
    let api = ApiClient::new(Config::for_base(BASE), src.clone());
    let ctx = RequestContext::from_query("?stream=bart_delays&horizon=310", &Delays::default()).unwrap();
    let view = DashboardController::new(api).load(ctx).await;

    assert_eq!(src.hits(), 4);
    assert_eq!(view.current_value, Section::Ready(7.5));
    assert!(matches!(view.chart, Chart::Cdf { .. }));
    assert_eq!(view.horizons.iter().filter(|b| b.current).map(|b| b.delay).collect::<Vec<_>>(), vec![310]);
    assert_eq!(view.nav.len(), 1);
    assert_eq!(view.nav[0].kind, NavKind::GoToStream);

    let text = render::render_dashboard(&view, 20);
    assert!(text.contains("[*310 sec*]"));
    assert!(text.contains("P(X<=x)"));
}

#[tokio::test]
async fn failing_sections_degrade_independently() {
    let src = StaticSource::new()
        .with(url("leaderboards/cop.json"), RawResponse::status(500))
        .with(url("live/cop.json"), RawResponse::ok("not json"))
        .with_json(url("lagged/cop.json"), &lagged_rows(2));
    let ctx = RequestContext::from_query("stream=cop", &Delays::default()).unwrap();
    let view = controller(src).load(ctx).await;

    assert_eq!(view.leaderboard, Section::Failed(FetchError::Status(500)));
    assert!(matches!(view.current_value, Section::Failed(FetchError::Malformed(_))));
    assert_eq!(view.lagged.ready().unwrap().len(), 2);
    assert!(matches!(view.chart, Chart::Bar { series: Section::Failed(FetchError::Status(404)), .. }));

    let text = render::render_dashboard(&view, 20);
    assert!(text.contains(NO_LEADERBOARD));
    assert!(!text.contains("Current value"));
    assert!(!text.contains(NO_LAGGED));
}

#[tokio::test]
async fn lagged_rows_are_capped() {
    let src = StaticSource::new().with_json(url("lagged/cop.json"), &lagged_rows(300));
    let ctx = RequestContext::from_query("stream=cop", &Delays::default()).unwrap();
    let view = controller(src).load(ctx).await;
    let points = view.lagged.ready().unwrap();
    assert_eq!(points.len(), 50);
    let table = render::render_lagged(&view.lagged, view.ctx.id.family);
    assert!(table.lines().count() <= MAX_LAGGED_ROWS + 2);
}

#[tokio::test]
async fn z_stream_uses_z_score_header() {
    let src = StaticSource::new().with_json(url("lagged/z1~bart_delays~70.json"), &lagged_rows(1));
    let ctx = RequestContext::from_query("stream=z1~bart_delays~70", &Delays::default()).unwrap();
    let view = controller(src).load(ctx).await;
    let text = render::render_dashboard(&view, 20);
    assert_eq!(header_cells(&text, "Timestamp"), vec!["Timestamp", "Z-Score"]);
    assert!(text.contains("Go to Parent -> stream_dashboard.html?stream=bart_delays"));
}

#[tokio::test]
async fn changed_filters_request_a_refresh() {
    let mut sel = Selection::from_stream("btc");
    sel.choose_filters("c5_", "_usd");
    let ctx = RequestContext::from_selection(&sel, &Delays::default()).unwrap();
    assert_eq!(ctx.request_key, "c5_btc_usd.json");
    let view = controller(StaticSource::new()).load(ctx).await;
    assert!(matches!(view.chart, Chart::Bar { refresh: true, .. }));
}

#[tokio::test]
async fn stream_list_offers_plain_streams_only() {
    let src = StaticSource::new().with_json(
        url("budgets/"),
        &json!({"bart_delays.json": 1.0, "z1~bart_delays~70.json": 1.0, "cop.json": "2"}),
    );
    let names = controller(src).stream_list().await;
    assert_eq!(names, Section::Ready(vec!["bart_delays".to_string(), "cop".to_string()]));
}

#[tokio::test]
async fn listed_streams_link_to_their_dashboards() {
    let src = StaticSource::new().with_json(url("budgets/"), &json!({"bart_delays.json": 1.0, "cop.json": 2.0}));
    let targets = controller(src).stream_links().await;
    let hrefs: Vec<String> = targets.ready().unwrap().iter().map(|t| t.href()).collect();
    assert_eq!(
        hrefs,
        vec!["stream_dashboard.html?stream=bart_delays", "stream_dashboard.html?stream=cop"]
    );

    let id = StreamId::from_display_name("910::cop", &Delays::default()).unwrap();
    let target = streamdash::stream::NavTarget::dashboard(&id);
    assert_eq!(target.query(), "stream=cop&horizon=910");
    let reparsed = RequestContext::from_query(&target.query(), &Delays::default()).unwrap();
    assert_eq!(reparsed.request_key, "910::cop.json");
}

#[tokio::test]
async fn views_export_as_json() {
    let src = StaticSource::new().with_json(url("live/cop.json"), &json!(1.5));
    let ctx = RequestContext::from_query("stream=cop", &Delays::default()).unwrap();
    let view = controller(src).load(ctx).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("view.json");
    std::fs::write(&path, view.to_json()).unwrap();
    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["ctx"]["request_key"], "cop.json");
    assert_eq!(parsed["current_value"]["state"], "ready");
    assert_eq!(parsed["current_value"]["value"], 1.5);
    assert_eq!(parsed["leaderboard"]["state"], "failed");
    assert_eq!(parsed["chart"]["kind"], "bar");
}
