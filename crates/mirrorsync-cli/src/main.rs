//! MirrorSync - periodic one-way folder mirroring
//!
//! Keeps a replica folder identical to a source folder, repeating the
//! synchronization every INTERVAL seconds and appending every change to a log
//! file.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use mirrorsync_config::{Config, ConfigLoader};
use mirrorsync_sync::{
    shutdown_channel, FileActionLog, SyncLoop, SyncOptions, SyncReport, Synchronizer,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// MirrorSync - periodic one-way folder mirroring
#[derive(Parser, Debug)]
#[command(
    name = "mirrorsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Periodic one-way folder mirroring",
    long_about = "MirrorSync keeps a replica folder identical to a source folder.\n\
                  Missing files are copied, extra files are removed and every file is\n\
                  rewritten from the source on each pass. Every change is appended to\n\
                  the log file and echoed to standard output."
)]
struct Cli {
    /// Path to source folder
    source: PathBuf,

    /// Path to replica folder
    replica: PathBuf,

    /// Path to log file
    log_file: PathBuf,

    /// Synchronization interval in seconds
    interval: u64,

    /// Configuration file path (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode - report each pass
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - no action echo, errors only
    #[arg(short, long)]
    quiet: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    /// Layer the command line over the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        config.sync.source = Some(self.source.clone());
        config.sync.replica = Some(self.replica.clone());
        config.sync.interval_secs = self.interval;
        config.log.file = Some(self.log_file.clone());

        if self.quiet {
            config.log.echo = false;
        }
    }

    /// Tracing level requested by flags, if any
    fn level_override(&self) -> Option<&'static str> {
        if self.debug {
            Some("debug")
        } else if self.verbose {
            Some("info")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_with(cli.config.as_deref(), |config| cli.apply_to(config))?;

    init_logging(cli.level_override().unwrap_or(config.logging.level.as_str()))?;

    info!("MirrorSync v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration:\n{}", ConfigLoader::to_yaml(&config)?);

    run(&config, cli.once, cli.quiet).await
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log level")?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

async fn run(config: &Config, once: bool, quiet: bool) -> Result<()> {
    let target = config.target()?;

    if !quiet {
        eprintln!(
            "{} Mirroring {} to {} every {}s (log: {})",
            style("⟲").blue().bold(),
            style(target.source.display()).cyan(),
            style(target.replica.display()).cyan(),
            style(config.sync.interval_secs).green(),
            style(target.log_file.display()).dim()
        );
    }

    let log = FileActionLog::new(&target.log_file).with_echo(config.log.echo);
    let synchronizer = Synchronizer::new(log, SyncOptions::from_config(config));
    let mut sync_loop = SyncLoop::new(
        synchronizer,
        target.source,
        target.replica,
        config.interval(),
    );
    if once {
        sync_loop = sync_loop.with_max_passes(1);
    }

    let (trigger, signal) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current pass");
            trigger.trigger();
        }
    });

    let passes = sync_loop
        .run_with(signal, |report| {
            if !quiet {
                eprintln!("{}", format_pass_summary(report));
            }
        })
        .await?;

    if !quiet {
        eprintln!(
            "{} Stopped after {} pass(es)",
            style("✓").green(),
            style(passes).green()
        );
    }
    Ok(())
}

/// One styled line per completed pass
fn format_pass_summary(report: &SyncReport) -> String {
    let failed = if report.files_failed > 0 {
        style(report.files_failed).red().bold()
    } else {
        style(report.files_failed).dim()
    };

    format!(
        "{} Pass done: {} copied, {} removed, {} updated, {} failed in {:.2?}",
        style("•").cyan(),
        style(report.files_copied).green(),
        style(report.files_removed).yellow(),
        style(report.files_updated).green(),
        failed,
        report.duration
    )
}
