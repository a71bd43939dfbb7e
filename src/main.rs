use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use queuewatch::config::duration::format_duration;
use queuewatch::{scheduler, Collector, Settings};
use queuewatch_adapters::{HttpTransport, Notifier, PrometheusFetcher};

#[derive(Parser, Debug)]
#[command(name = "queuewatch", version)]
#[command(about = "Periodically reports Prometheus query results to a notification endpoint")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scrape interval (e.g., "24h", "15m", "30s")
    #[arg(short = 't', long)]
    interval: Option<String>,

    /// Prometheus address
    #[arg(long = "p8s")]
    prometheus: Option<String>,

    /// Notifications endpoint
    #[arg(long)]
    notify: Option<String>,

    /// Link to Grafana dashboard
    #[arg(long)]
    grafana: Option<String>,

    /// Server name
    #[arg(long)]
    server: Option<String>,

    /// HTTP request timeout (e.g., "10s")
    #[arg(long)]
    timeout: Option<String>,

    /// Run a single cycle immediately and exit
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(interval) = self.interval {
            settings.interval = interval;
        }
        if let Some(prometheus) = self.prometheus {
            settings.prometheus = prometheus;
        }
        if let Some(notify) = self.notify {
            settings.notify = Some(notify);
        }
        if let Some(grafana) = self.grafana {
            settings.grafana = Some(grafana);
        }
        if let Some(server) = self.server {
            settings.server = server;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout = timeout;
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let mut settings = Settings::load(args.config.as_deref())?;
    let once = args.once;
    args.apply(&mut settings);
    settings.validate()?;

    let interval = settings.interval()?;
    let transport = HttpTransport::builder()
        .timeout(settings.timeout()?)
        .build()
        .context("failed to build HTTP client")?;
    let notify = settings
        .notify
        .clone()
        .context("a notification endpoint is required")?;

    let fetcher = PrometheusFetcher::new(transport.clone(), settings.prometheus.clone());
    let notifier = Notifier::new(transport, notify);
    let mut collector = Collector::new(settings.build_metrics(), fetcher, notifier);

    info!(
        interval = %format_duration(interval),
        prometheus = %settings.prometheus,
        metrics = collector.metrics().len(),
        "starting"
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        scheduler::shutdown_signal().await;
        info!("shutdown requested");
        trigger.cancel();
    });

    if once {
        collector.collect(&cancel).await?;
        return Ok(());
    }

    scheduler::run(&mut collector, interval, &cancel).await?;
    Ok(())
}
