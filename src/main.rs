//! Main entry point for the league ratings service
//!
//! Runs the HTTP API, or performs a single league operation against the
//! configured data directory and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use league_ratings::config::AppConfig;
use league_ratings::metrics::MetricsCollector;
use league_ratings::service::{ApiServer, ApiState};
use league_ratings::utils::format_rating;
use league_ratings::{
    GameResult, JsonFileResultSource, JsonFileStore, LeagueService, ResultSource,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// League Ratings - margin-of-victory team ratings and game predictions
#[derive(Parser)]
#[command(
    name = "league-ratings",
    version,
    about = "Margin-of-victory team ratings and game predictions for sports leagues",
    long_about = "League Ratings keeps a zero-sum rating per team, updates it after every \
                 completed game from the difference between the actual and the expected \
                 margin of victory, and serves standings and win predictions over HTTP."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Override the league data directory")]
    data_dir: Option<PathBuf>,

    /// K-factor override
    #[arg(long, value_name = "K", help = "Override the rating K-factor")]
    k_factor: Option<f64>,

    /// Home advantage override
    #[arg(long, value_name = "POINTS", help = "Override the home advantage in points")]
    home_advantage: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, help = "Override the bind host")]
        host: Option<String>,
        #[arg(long, help = "Override the bind port")]
        port: Option<u16>,
    },
    /// Print the standings table
    Standings,
    /// Print one team's rating
    Rating {
        /// Team id or display name
        team: String,
    },
    /// Predict the margin and home win probability of a game
    Predict { home: String, away: String },
    /// Record a completed game
    Record {
        home: String,
        away: String,
        home_score: u32,
        away_score: u32,
    },
    /// Record new results from a JSON results file
    Ingest {
        /// Results file, defaults to the configured one
        file: Option<PathBuf>,
    },
    /// Print the game log
    Games {
        #[arg(long, help = "Only show the most recent N games")]
        limit: Option<usize>,
    },
    /// Print a league summary
    Summary,
    /// Export the current ratings as JSON
    Export {
        #[arg(short, long, value_name = "FILE", help = "Write to FILE instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Discard the game log and restore the initial ratings
    Reset,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    if let Some(k_factor) = args.k_factor {
        config.rating.k_factor = k_factor;
    }

    if let Some(home_advantage) = args.home_advantage {
        config.rating.home_advantage = home_advantage;
    }

    if let Command::Serve { host, port } = &args.command {
        if let Some(host) = host {
            config.service.host = host.clone();
        }
        if let Some(port) = port {
            config.service.port = *port;
        }
    }

    league_ratings::config::validate_config(&config)?;
    Ok(config)
}

fn open_league(config: &AppConfig) -> Result<Arc<LeagueService>> {
    let store = Arc::new(JsonFileStore::new(&config.storage.data_dir));
    let metrics = Arc::new(MetricsCollector::new()?);
    let service = LeagueService::open(store, config.rating.parameters(), metrics)?;
    Ok(Arc::new(service))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("League Ratings Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Data dir: {}", config.storage.data_dir.display());
    info!(
        "   K-factor: {}, home advantage: {}",
        config.rating.k_factor, config.rating.home_advantage
    );
    match &config.source.results_file {
        Some(path) => info!("   Results file: {}", path.display()),
        None => info!("   Results file: none"),
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    display_startup_banner(&config);

    let service = open_league(&config)?;
    let source: Option<Arc<dyn ResultSource>> = config
        .source
        .results_file
        .as_ref()
        .map(|path| Arc::new(JsonFileResultSource::new(path)) as Arc<dyn ResultSource>);

    let server = Arc::new(ApiServer::new(
        config.bind_address()?,
        ApiState { service, source },
    ));

    let server_task = {
        let server = server.clone();
        tokio::spawn(async move { server.start().await })
    };

    info!("Press Ctrl+C to shutdown gracefully...");
    wait_for_shutdown_signal().await;

    server.stop();
    server_task.await.context("League API task failed")??;

    info!("League Ratings Service stopped");
    Ok(())
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    match args.command {
        Command::Serve { .. } => serve(config).await,
        Command::Standings => {
            let service = open_league(&config)?;
            for standing in service.standings().await {
                println!(
                    "{:>3}  {:<30} {:>8}",
                    standing.rank,
                    standing.display_name,
                    format_rating(standing.rating)
                );
            }
            Ok(())
        }
        Command::Rating { team } => {
            let service = open_league(&config)?;
            println!(
                "{}: {}",
                service.display_name(&team).await,
                format_rating(service.rating_of(&team).await)
            );
            Ok(())
        }
        Command::Predict { home, away } => {
            let service = open_league(&config)?;
            print_json(&service.predict(&home, &away).await)
        }
        Command::Record {
            home,
            away,
            home_score,
            away_score,
        } => {
            let service = open_league(&config)?;
            let record = service
                .record_game(GameResult::new(home, away, home_score, away_score))
                .await?;
            print_json(&record)
        }
        Command::Ingest { file } => {
            let path = file
                .or_else(|| config.source.results_file.clone())
                .context("No results file given or configured")?;
            let service = open_league(&config)?;
            let report = service.ingest(&JsonFileResultSource::new(path)).await?;
            print_json(&report)
        }
        Command::Games { limit } => {
            let service = open_league(&config)?;
            let games = match limit {
                Some(limit) => service.recent_games(limit).await,
                None => service.games().await,
            };
            print_json(&games)
        }
        Command::Summary => {
            let service = open_league(&config)?;
            print_json(&service.summary().await)
        }
        Command::Export { output } => {
            let service = open_league(&config)?;
            let export = serde_json::to_string_pretty(&service.export().await)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, export)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Ratings exported to {}", path.display());
                }
                None => println!("{}", export),
            }
            Ok(())
        }
        Command::Reset => {
            let service = open_league(&config)?;
            service.reset().await?;
            println!("League reset to initial ratings");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
