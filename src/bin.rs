//! Binary entry point for `release-relay`.
//!
//! Loads configuration, applies command-line overrides for the listener, and
//! serves the GitHub webhook endpoint until Ctrl-C.

use clap::Parser;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use release_relay::base::{config::Config, types::Void};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Release-relay – announces GitHub releases in Slack.
///
/// Settings come from `.hidden/config.toml` (or `--config`) and
/// `RELEASE_RELAY_*` environment variables. The flags below take precedence
/// over both.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Config file path (defaults to `.hidden/config.toml` when present).
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Address the webhook listener binds to, e.g. `127.0.0.1:8080`.
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,
    /// Also run `gh webhook forward` so deliveries reach a local listener.
    #[arg(short, long)]
    forward: bool,
    /// Increase log verbosity (-v: DEBUG, -vv: TRACE).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    init_tracing(args.verbose)?;

    let config = Config::load(args.config.as_deref())?.with_overrides(args.bind, args.forward)?;

    info!(
        repository = %config.repo_filter().full_name(),
        all = %config.all_releases_channel,
        breaking = %config.breaking_changes_channel,
        "Relaying releases."
    );

    release_relay::start(config).await
}

/// Installs the stdout and OTLP tracing layers.
fn init_tracing(verbose: u8) -> Void {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let stdout = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
    let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("release-relay");
    let otel = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry().with(otel).with(level_filter).with(stdout).init();

    Ok(())
}
