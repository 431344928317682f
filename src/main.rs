// src/main.rs
//! Trace replay driver for the browser URL redirector
//!
//! Feeds recorded UI events (JSON lines) through the redirector against a
//! simulated host and reports what would have been written back into each
//! browser's address bar.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use url_redirector::core::registry::BrowserRegistry;
use url_redirector::core::service_info::ServiceInfo;
use url_redirector::replay::{parse_line, SimulatedHost};
use url_redirector::{HandleOutcome, Redirector, RedirectorConfig};

/// Command line interface for the redirector trace replay
#[derive(Debug, Parser)]
#[command(
    name = "url-redirector",
    about = "Replay browser UI events through the URL redirector",
    long_about = "Reads UI state change events as JSON lines, extracts the address bar URL of tracked browsers, and shows which URLs would be rewritten and injected back."
)]
struct Args {
    /// JSON config file (defaults to the built-in browser table and rules)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trace file with one JSON event per line; stdin when omitted
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Capability level of the simulated host
    #[arg(long, default_value = "direct", value_enum)]
    host: HostLevel,

    /// Output format for per-event outcomes
    #[arg(long, default_value = "human", value_enum)]
    format: OutputFormat,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the host registration request as JSON and exit
    #[arg(long)]
    print_service_info: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum HostLevel {
    /// Newer host with direct text replacement
    Direct,
    /// Older host that only supports paste, via the clipboard
    Clipboard,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// One JSON object per event
    Json,
}

struct ReplayApp {
    redirector: Redirector<SimulatedHost>,
    args: Args,
}

impl ReplayApp {
    fn new(args: Args, config: RedirectorConfig) -> Result<Self> {
        let host = match args.host {
            HostLevel::Direct => SimulatedHost::direct(),
            HostLevel::Clipboard => SimulatedHost::clipboard_only(),
        };
        let clipboard = host.clipboard();
        let redirector = Redirector::with_host(host, Some(clipboard), config)
            .context("Failed to set up redirector for simulated host")?;

        Ok(Self { redirector, args })
    }

    /// Replay every event until the input ends or Ctrl+C
    async fn run(&mut self) -> Result<()> {
        let input: Box<dyn AsyncRead + Unpin> = match &self.args.trace {
            Some(path) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open trace {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };
        let mut lines = BufReader::new(input).lines();

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut line_number = 0usize;
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read trace input")?,
                _ = &mut shutdown => {
                    info!("Interrupted, stopping replay");
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };
            line_number += 1;

            let trace = match parse_line(&line) {
                Ok(Some(trace)) => trace,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping malformed trace line {}: {}", line_number, e);
                    continue;
                }
            };

            let event = self.redirector.tree().materialize(&trace);
            let outcome = self.redirector.handle(event);
            self.report(line_number, trace.app.as_deref(), &outcome)?;
        }

        self.print_summary()
    }

    fn report(&self, line_number: usize, app: Option<&str>, outcome: &HandleOutcome) -> Result<()> {
        match self.args.format {
            OutputFormat::Human => match outcome {
                HandleOutcome::Injected { url, rewritten, strategy } => {
                    println!("🔀 #{} {}: {} -> {} ({:?})", line_number, app.unwrap_or("?"), url, rewritten, strategy);
                }
                HandleOutcome::InjectionFailed { url, reason, .. } => {
                    println!("❌ #{} {}: {} not rewritten: {}", line_number, app.unwrap_or("?"), url, reason);
                }
                other if self.args.verbose > 0 => {
                    println!("   #{} {}: {:?}", line_number, app.unwrap_or("?"), other);
                }
                _ => {}
            },
            OutputFormat::Json => {
                let json_event = serde_json::json!({
                    "line": line_number,
                    "processed_at": chrono::Utc::now().to_rfc3339(),
                    "app": app,
                    "result": outcome,
                });
                println!("{}", serde_json::to_string(&json_event).context("Failed to encode outcome")?);
            }
        }
        Ok(())
    }

    fn print_summary(&self) -> Result<()> {
        let stats = self.redirector.stats();
        match self.args.format {
            OutputFormat::Human => {
                println!("\n📊 {} events replayed", stats.events_seen);
                println!("   Redirected:        {}", stats.injected);
                println!("   Injection failed:  {}", stats.injection_failed);
                println!("   Debounced:         {}", stats.debounced);
                println!("   No rule match:     {}", stats.no_rule_match);
                println!("   Not a text input:  {}", stats.not_text_input);
                println!("   No URL:            {}", stats.no_url);
                println!("   Untracked app:     {}", stats.unknown_application);
                println!("   Ignored kind:      {}", stats.ignored_kind);
                println!("   Malformed:         {}", stats.malformed);
                println!("   Tracked detections: {}", self.redirector.tracked_detections());
            }
            OutputFormat::Json => {
                let summary = serde_json::json!({
                    "summary": stats,
                    "tracked_detections": self.redirector.tracked_detections(),
                });
                println!("{}", serde_json::to_string(&summary).context("Failed to encode summary")?);
            }
        }
        Ok(())
    }

    /// Set up logging based on verbosity level
    fn setup_logging(args: &Args) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let level = match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(args.verbose > 1)
            .with_thread_ids(args.verbose > 2)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

        Ok(())
    }
}

fn load_config(args: &Args) -> Result<RedirectorConfig> {
    match &args.config {
        Some(path) => RedirectorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RedirectorConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    ReplayApp::setup_logging(&args)?;

    let config = load_config(&args)?;

    if args.check_config {
        config.validate().context("Configuration is invalid")?;
        println!(
            "✅ Configuration OK: {} browsers, {} rules, {}ms debounce window",
            config.browsers.len(),
            config.rules.len(),
            config.debounce_window_ms
        );
        return Ok(());
    }

    if args.print_service_info {
        let registry = BrowserRegistry::new(config.browsers.clone());
        let info = ServiceInfo::from_registry(&registry, &config);
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to encode service info")?
        );
        return Ok(());
    }

    info!("🚀 Starting URL redirector replay v{}", env!("CARGO_PKG_VERSION"));

    let mut app = ReplayApp::new(args, config).context("Failed to initialize replay")?;
    app.run().await.context("Replay failed")?;

    Ok(())
}
