//! Release tracker CLI
//!
//! Local execution entry point. For AWS Lambda, use `release-tracker-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use release_tracker::{
    config::load_config,
    error::Result,
    models::ProjectId,
    pipeline::MonitorScheduler,
    storage,
};
use tokio_util::sync::CancellationToken;

/// release-tracker - Release Feed Monitor
#[derive(Parser, Debug)]
#[command(
    name = "release-tracker",
    version,
    about = "Watches project release feeds and announces new releases"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor all configured projects
    Start {
        /// Poll every project once, then exit
        #[arg(long)]
        once: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the stored releases of one project
    Info {
        /// Project URL, e.g. https://github.com/acme/widget
        project_url: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel `token` on Ctrl+C or SIGTERM.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut terminate) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = terminate.recv() => {}
                    }
                }
                Err(e) => {
                    log::warn!("Cannot listen for SIGTERM: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        log::info!("Signal received, stopping monitors...");
        token.cancel();
    });
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.config)?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Start { once } => {
            config.monitor.one_shot |= once;

            let token = CancellationToken::new();
            spawn_signal_handler(token.clone());

            let scheduler = MonitorScheduler::from_config(&config).await?;
            let summary = scheduler.run(&config.projects, token).await?;

            log::info!(
                "Monitored {} project(s) ({} skipped): {} new release(s), {} failed cycle(s)",
                summary.projects,
                summary.skipped,
                summary.new_releases,
                summary.failed_cycles
            );
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!(
                "  storage: {:?}, max parallelism {}, {} attempt(s) per cycle",
                config.storage.provider,
                config.monitor.max_parallelism,
                config.monitor.max_attempts
            );
            log::info!(
                "  announcers: slack={}, email={}",
                config.announcer.slack.enabled,
                config.announcer.email.enabled
            );

            for project in &config.projects {
                match ProjectId::from_url(&project.url) {
                    Ok(id) => log::info!(
                        "  {} -> {} (every {} min, feed {})",
                        project.name,
                        id,
                        project.check_interval_minutes,
                        project.feed_url()
                    ),
                    Err(e) => log::warn!("  {} will be skipped: {}", project.name, e),
                }
            }
        }

        Command::Info { project_url } => {
            let id = ProjectId::from_url(&project_url)?;
            let store = storage::from_config(&config.storage).await?;
            let key = id.storage_key();

            if !store.exists(&key).await {
                log::info!("No releases stored for {} yet.", id);
                return Ok(());
            }

            let releases = store.get(&key).await?;
            log::info!(
                "{} release(s) stored at {}",
                releases.len(),
                store.location(&key)
            );
            for release in releases {
                let published = release
                    .published_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                log::info!("  {}  {}  {}", release.version, published, release.url);
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
