use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classhold::app::App;
use classhold::config::Config;
use classhold::models::NewReservation;
use classhold::scheduler::CycleOutcome;
use classhold::server::{ApiServer, AppState};

#[derive(Parser)]
#[command(
    name = "classhold",
    version,
    about = "Books studio classes as soon as the booking window opens",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to CLASSHOLD_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API together with the reservation loop
    Serve {
        /// Override the bind address
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,

        /// Serve the API without running the reservation loop
        #[arg(long, default_value = "false")]
        no_reserver: bool,
    },

    /// Run a single reservation cycle now
    Tick,

    /// Show the live class catalog for a date
    Classes {
        /// Class date (MM/DD/YYYY)
        #[arg(short, long)]
        date: String,
    },

    /// Record a reservation intent
    Reserve {
        #[arg(short, long)]
        email: String,

        /// Class date (MM/DD/YYYY)
        #[arg(short, long)]
        date: String,

        /// Start time as listed in the catalog (e.g. 6:00PM)
        #[arg(short, long)]
        time: String,

        /// Class name identifier (e.g. cid1764796689)
        #[arg(long)]
        name_id: String,

        /// Teacher identifier (e.g. bio100000157)
        #[arg(long)]
        teacher_id: String,
    },

    /// Show reservation counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    if let Err(e) = classhold::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed");
    }

    let app = App::from_config(config).context("Failed to initialize classhold")?;

    match cli.command {
        Commands::Serve { bind, no_reserver } => {
            tracing::info!(bind = ?bind, no_reserver, "Starting serve command");
            serve(app, bind, no_reserver).await?;
        }

        Commands::Tick => {
            tracing::info!("Starting tick command");
            tick(app).await?;
        }

        Commands::Classes { date } => {
            tracing::info!(date = %date, "Starting classes command");
            classes(app, &date).await?;
        }

        Commands::Reserve {
            email,
            date,
            time,
            name_id,
            teacher_id,
        } => {
            tracing::info!(email = %email, date = %date, time = %time, "Starting reserve command");
            let id = app.service.submit(NewReservation {
                email,
                date,
                time,
                name_id,
                teacher_id,
            })?;
            println!("Reservation #{id} recorded (pending)");
        }

        Commands::Stats => {
            let stats = app.service.stats()?;
            println!("Reservations");
            println!("  Total:   {}", stats.total);
            println!("  Pending: {}", stats.pending);
            println!("  Done:    {}", stats.done);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("classhold=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("classhold={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn serve(app: App, bind: Option<std::net::SocketAddr>, no_reserver: bool) -> Result<()> {
    let mut server_config = app.config.server.clone();
    if let Some(bind) = bind {
        server_config.bind_address = bind;
    }

    let mut state = AppState::new(app.service.clone());
    if !no_reserver {
        state = state.with_reserver(app.reserver.clone());
    }

    let server = ApiServer::new(server_config, state);
    server
        .start_with_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn tick(app: App) -> Result<()> {
    let outcome = app.reserver.run_cycle().await?;

    match outcome {
        CycleOutcome::Gated { local_hour } => {
            println!("Outside the booking window (local hour {local_hour}); nothing attempted");
        }
        CycleOutcome::Idle { target_date } => {
            println!("No pending reservations for {target_date}");
        }
        CycleOutcome::FetchFailed {
            target_date,
            reason,
        } => {
            println!("Could not fetch catalog for {target_date}: {reason}");
        }
        CycleOutcome::Completed(report) => {
            println!("Cycle for {}", report.target_date);
            println!("  Pending:   {}", report.pending);
            println!("  Booked:    {}", report.booked);
            println!("  Unmatched: {}", report.unmatched);
            println!("  Failed:    {}", report.failed);
        }
    }

    Ok(())
}

async fn classes(app: App, date: &str) -> Result<()> {
    let slots = app.service.classes(date).await?;

    if slots.is_empty() {
        println!("No classes listed for {date}");
        return Ok(());
    }

    println!(
        "{:<4} {:<9} {:<28} {:<20} {:<16} {:<14} {:<14} {}",
        "#", "Time", "Class", "Teacher", "Location", "Name ID", "Teacher ID", "Booking"
    );
    for slot in &slots {
        println!(
            "{:<4} {:<9} {:<28} {:<20} {:<16} {:<14} {:<14} {}",
            slot.index,
            slot.time,
            slot.name,
            slot.teacher,
            slot.location,
            slot.name_id,
            slot.teacher_id,
            if slot.is_bookable() { slot.id.as_str() } else { "-" }
        );
    }

    Ok(())
}
