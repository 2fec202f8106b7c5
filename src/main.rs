//! Terminal dashboard for prediction streams.
//!
//! Usage:
//!   streamdash <command> [options]
//!
//! Commands:
//!   dashboard [<query>]   - Leaderboard, current value, lagged values and chart for one stream
//!   streams               - Streams listed by the budgets endpoint, with dashboard links
//!   prizes                - Current prizes with sponsor names
//!   inspect <key>         - Parse a stream key offline and show its request key and links

use anyhow::{bail, Context, Result};
use serde_json::json;

use streamdash::api::ApiClient;
use streamdash::config::Config;
use streamdash::dashboard::{DashboardController, RequestContext, Selection};
use streamdash::logging::{json_log, log, obj, v_str, Domain, Level};
use streamdash::render;
use streamdash::stream::{horizon_buttons, links, StreamId};

fn print_usage() {
    eprintln!("Usage: streamdash <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  dashboard [<query>]   Show one stream, e.g. \"stream=bart_delays&horizon=310\"");
    eprintln!("  streams               List streams with their dashboard links");
    eprintln!("  prizes                List current prizes");
    eprintln!("  inspect <key>         Parse a key such as 310::bart_delays.json");
    eprintln!();
    eprintln!("Dashboard options:");
    eprintln!("  --stream=<name>       Primary stream (default $STREAMDASH_STREAM)");
    eprintln!("  --horizon=<secs>      Horizon; reset to the smallest delay when not permitted");
    eprintln!("  --secondary=<prefix>  Secondary filter");
    eprintln!("  --tertiary=<suffix>   Tertiary filter");
    eprintln!("  --json                Print the view as JSON");
    eprintln!("  --export=<path>       Also write the view as JSON to a file");
    eprintln!();
    eprintln!("Connection options:");
    eprintln!("  --api-base=<url> --plots-base=<url> --animal-base=<url>");
    eprintln!("  --delays=<d1,d2,..> --timeout=<secs> --retries=<n> --lagged-limit=<n>");
}

#[derive(Debug, Default)]
struct Args {
    command: String,
    positional: Vec<String>,
    options: Vec<(String, String)>,
    flags: Vec<String>,
}

impl Args {
    fn parse(raw: &[String]) -> Self {
        let mut args = Args::default();
        for arg in raw {
            if let Some(rest) = arg.strip_prefix("--") {
                match rest.split_once('=') {
                    Some((k, v)) => args.options.push((k.to_string(), v.to_string())),
                    None => args.flags.push(rest.to_string()),
                }
            } else if args.command.is_empty() {
                args.command = arg.clone();
            } else {
                args.positional.push(arg.clone());
            }
        }
        args
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.options.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn flag(&self, key: &str) -> bool {
        self.flags.iter().any(|f| f == key)
    }
}

fn selection_from(args: &Args, cfg: &Config) -> Selection {
    let mut sel = Selection::from_stream(args.option("stream").unwrap_or(&cfg.default_stream));
    if args.option("secondary").is_some() || args.option("tertiary").is_some() {
        sel.choose_filters(args.option("secondary").unwrap_or(""), args.option("tertiary").unwrap_or(""));
    }
    sel.horizon = args.option("horizon").map(str::to_string);
    sel
}

async fn cmd_dashboard(args: &Args, controller: &DashboardController) -> Result<()> {
    let cfg = controller.api().config();
    let ctx = match args.positional.first() {
        Some(query) => RequestContext::from_query(query, &cfg.delays)?,
        None => RequestContext::from_selection(&selection_from(args, cfg), &cfg.delays)?,
    };
    json_log(
        "dashboard",
        obj(&[("stream", v_str(&ctx.id.to_string())), ("key", v_str(&ctx.request_key))]),
    );

    let view = controller.load(ctx).await;
    if let Some(path) = args.option("export") {
        std::fs::write(path, view.to_json()).with_context(|| format!("writing {}", path))?;
    }
    let out = if args.flag("json") {
        format!("{}\n", view.to_json())
    } else {
        render::render_dashboard(&view, cfg.bar_width)
    };
    log(
        Level::Debug,
        Domain::Render,
        "rendered",
        obj(&[("stream", v_str(&view.ctx.id.to_string())), ("bytes", json!(out.len()))]),
    );
    print!("{}", out);
    Ok(())
}

async fn cmd_streams(controller: &DashboardController) -> Result<()> {
    print!("{}", render::render_streams(&controller.stream_links().await));
    Ok(())
}

async fn cmd_prizes(controller: &DashboardController) -> Result<()> {
    print!("{}", render::render_prizes(&controller.prizes().await));
    Ok(())
}

fn cmd_inspect(args: &Args, cfg: &Config) -> Result<()> {
    let Some(key) = args.positional.first() else {
        bail!("inspect needs a key");
    };
    let id = StreamId::from_dictionary_key(key, &cfg.delays)?;
    let summary = json!({
        "name": id.name(),
        "base": id.base,
        "modifiers": id.modifiers,
        "family": id.family,
        "horizon": id.horizon,
        "trailing_delay": id.trailing_delay(&cfg.delays),
        "request_key": id.request_key(),
        "lagged_key": id.lagged_key(),
        "horizons": horizon_buttons(&id, &cfg.delays).iter().map(|b| b.target.href()).collect::<Vec<_>>(),
        "links": links(&id, &cfg.delays).iter().map(|t| json!({"label": t.label, "href": t.href()})).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(&raw);
    if args.command.is_empty() || args.flag("help") {
        print_usage();
        std::process::exit(1);
    }

    let mut cfg = Config::from_env();
    for (k, v) in &args.options {
        cfg.apply_override(k, v);
    }
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("command", v_str(&args.command)),
            ("url", v_str(&cfg.api_base)),
            ("delays", json!(cfg.delays.as_slice())),
            ("retries", json!(cfg.max_retries)),
        ]),
    );

    if args.command == "inspect" {
        return cmd_inspect(&args, &cfg);
    }

    let controller = DashboardController::new(ApiClient::from_config(cfg)?);
    match args.command.as_str() {
        "dashboard" => cmd_dashboard(&args, &controller).await,
        "streams" => cmd_streams(&controller).await,
        "prizes" => cmd_prizes(&controller).await,
        other => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}
