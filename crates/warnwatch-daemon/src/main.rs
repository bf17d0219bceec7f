//! `warnwatch` — civil-warning ingestion daemon.
//!
//! Reads `warnwatch.toml` (or the path given with `--config`), opens the
//! SQLite store, and announces every new warning exactly once.
//!
//! ```text
//! warnwatch run
//! warnwatch status --state rewritten
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use warnwatch_core::{
  lifecycle::LifecycleState,
  source::LogoSource,
  store::FeedLedger,
};
use warnwatch_daemon::{
  AnyDelivery, DaemonConfig, WARNINGS_FEED, feed_pipeline, open_store,
  runner::{Cycle, run_every, shutdown_on},
  warning_pipeline,
};
use warnwatch_http::WarnApiClient;
use warnwatch_pipeline::catalog::RefreshOutcome;

#[derive(Parser)]
#[command(author, version, about = "Civil-warning ingestion daemon")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "warnwatch.toml", env = "WARNWATCH_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run both feeds on their interval until Ctrl-C (the default).
  Run,
  /// Run one cycle of each enabled feed and exit.
  Once,
  /// Show lifecycle counts, or the ids at one state.
  Status {
    /// Restrict to one feed (default: all configured feeds).
    #[arg(long)]
    feed:  Option<String>,
    /// List ids at this state: new, unseen, rewritten or seen.
    #[arg(long)]
    state: Option<String>,
  },
  /// Fetch the sender catalog now and replace the stored one.
  RefreshCatalog,
  /// Download a logo asset from the catalog's image host.
  Logo {
    filename: String,
    /// Output path (default: the file name in the current directory).
    #[arg(short, long)]
    out:      Option<PathBuf>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = DaemonConfig::load(&cli.config)?;

  match cli.command.unwrap_or(Command::Run) {
    Command::Run => run(&config).await,
    Command::Once => once(&config).await,
    Command::Status { feed, state } => status(&config, feed, state).await,
    Command::RefreshCatalog => refresh_catalog(&config).await,
    Command::Logo { filename, out } => logo(&config, &filename, out).await,
  }
}

async fn run(config: &DaemonConfig) -> anyhow::Result<()> {
  let store = open_store(config).await?;
  let client = warnwatch_http::http_client(config.http_timeout())?;
  let delivery = AnyDelivery::from_config(&config.delivery, client.clone())?;
  let warnings = warning_pipeline(config, &store, client.clone()).await?;
  let feed = feed_pipeline(config, &store, client);

  let shutdown = shutdown_on(tokio::signal::ctrl_c());

  let interval = config.interval();
  tokio::join!(
    run_every(warnings, &delivery, interval, shutdown.clone()),
    async {
      if let Some(feed) = feed {
        run_every(feed, &delivery, interval, shutdown.clone()).await;
      }
    },
  );
  Ok(())
}

async fn once(config: &DaemonConfig) -> anyhow::Result<()> {
  let store = open_store(config).await?;
  let client = warnwatch_http::http_client(config.http_timeout())?;
  let delivery = AnyDelivery::from_config(&config.delivery, client.clone())?;

  let mut warnings = warning_pipeline(config, &store, client.clone()).await?;
  let report = warnings.cycle(&delivery).await.context("warning cycle failed")?;
  println!(
    "{WARNINGS_FEED}: {} admitted, {} delivered, {} failed",
    report.admitted,
    report.delivered,
    report.build_failures.len() + report.delivery_failures.len()
  );

  if let Some(mut feed) = feed_pipeline(config, &store, client) {
    let report = feed.cycle(&delivery).await.context("feed cycle failed")?;
    println!(
      "{}: {} admitted, {} delivered",
      feed.feed(),
      report.admitted,
      report.delivered
    );
  }
  Ok(())
}

async fn status(
  config: &DaemonConfig,
  feed: Option<String>,
  state: Option<String>,
) -> anyhow::Result<()> {
  let state = state.as_deref().map(LifecycleState::parse).transpose()?;
  let store = open_store(config).await?;

  let feeds = match feed {
    Some(f) => vec![f],
    None => {
      let mut all = vec![WARNINGS_FEED.to_owned()];
      if config.feed.enabled {
        all.push(config.feed.name.clone());
      }
      all
    }
  };

  for name in feeds {
    let ledger = store.ledger(name.clone());
    match state {
      Some(state) => {
        for id in ledger.ids_in_state(state).await? {
          println!("{name}\t{state}\t{id}");
        }
      }
      None => {
        let counts = ledger.state_counts().await?;
        let summary: Vec<String> = counts
          .iter()
          .map(|(state, n)| format!("{state}={n}"))
          .collect();
        println!("{name}\t{}", summary.join(" "));
      }
    }
  }
  Ok(())
}

async fn refresh_catalog(config: &DaemonConfig) -> anyhow::Result<()> {
  let store = open_store(config).await?;
  let client = warnwatch_http::http_client(config.http_timeout())?;
  let mut warnings = warning_pipeline(config, &store, client).await?;

  let source = warnings.source().clone();
  match warnings.catalog_mut().refresh(&source).await? {
    RefreshOutcome::Replaced(n) => println!("catalog replaced: {n} senders"),
    RefreshOutcome::Kept => anyhow::bail!("catalog source unreachable, previous catalog kept"),
  }
  Ok(())
}

async fn logo(config: &DaemonConfig, filename: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
  let client = warnwatch_http::http_client(config.http_timeout())?;
  let api = WarnApiClient::new(client, config.warnings.clone());
  let bytes = api
    .fetch_logo(filename)
    .await
    .with_context(|| format!("failed to fetch logo {filename:?}"))?;

  let out = out.unwrap_or_else(|| PathBuf::from(filename));
  tokio::fs::write(&out, &bytes)
    .await
    .with_context(|| format!("failed to write {out:?}"))?;
  println!("{} bytes written to {}", bytes.len(), out.display());
  Ok(())
}
