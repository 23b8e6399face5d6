use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shift_analytics::api::state::AppState;
use shift_analytics::api::{build_router, cors_layer};
use shift_analytics::calculate::{
    population_overview, predict, subject_rankings, toughest_for, PercentileOutcome,
};
use shift_analytics::config::AppConfig;
use shift_analytics::fetch::{FileSource, HttpSource, ShiftSource};
use shift_analytics::models::{ShiftId, ShiftSummary, SortMode, Subject, ViewState};
use shift_analytics::parse_duration;
use shift_analytics::sync::RefreshCoordinator;

#[derive(Parser)]
#[command(name = "shift-analytics")]
#[command(about = "Per-shift exam difficulty and marks-to-percentile prediction")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Read scores from a saved JSON payload instead of the live API
    #[arg(long)]
    input: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once and print the shift leaderboard
    Summary {
        /// Leaderboard order (date, mean)
        #[arg(long, default_value = "date")]
        sort: SortMode,

        /// Shift to highlight
        #[arg(long)]
        selected: Option<String>,
    },

    /// Fetch once and predict the percentile for a score
    Predict {
        /// Marks out of 300
        #[arg(long)]
        score: String,

        /// Shift to predict against (defaults to the hardest shift)
        #[arg(long)]
        shift: Option<String>,
    },

    /// Refresh continuously, logging each applied snapshot
    Watch {
        /// Refresh interval (e.g., "15m", "90s"); defaults to the config value
        #[arg(long)]
        interval: Option<String>,
    },

    /// Start the API server with background refresh
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting shift-analytics v{}", env!("CARGO_PKG_VERSION"));

    let source: Arc<dyn ShiftSource> = match &cli.input {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(HttpSource::new(&config.source)?),
    };
    let coordinator = Arc::new(RefreshCoordinator::new());

    match cli.command {
        Commands::Summary { sort, selected } => {
            coordinator.refresh(source.as_ref()).await?;
            let shifts = coordinator.shifts().await;

            let mut view = ViewState::default().with_sort(sort);
            if let Some(id) = selected {
                view = view.with_selected(ShiftId::new(id));
            }
            print_summary(&shifts, &view);
        }
        Commands::Predict { score, shift } => {
            coordinator.refresh(source.as_ref()).await?;
            let shifts = coordinator.shifts().await;

            let mut view = ViewState::default();
            if let Some(id) = shift {
                view = view.with_selected(ShiftId::new(id));
            }
            let selected = view.resolve(&shifts);
            let outcome = match score.trim().parse::<f64>() {
                Ok(score) => predict(score, selected),
                Err(_) => PercentileOutcome::Unavailable,
            };

            match selected {
                Some(s) => println!("{} in {}: {}", score.trim(), s.id, outcome),
                None => println!("{}", outcome),
            }
        }
        Commands::Watch { interval } => {
            let period = resolve_interval(interval.as_deref(), &config)?;
            tracing::info!("Watching shift scores (interval: {:?})", period);

            tokio::spawn(coordinator.clone().run_periodic(source, period));
            spotlight(coordinator, period).await;
        }
        Commands::Serve { host, port } => {
            let period = resolve_interval(None, &config)?;
            tokio::spawn(coordinator.clone().run_periodic(source.clone(), period));

            let state = AppState {
                coordinator,
                source,
            };
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn resolve_interval(flag: Option<&str>, config: &AppConfig) -> Result<Duration> {
    match flag {
        Some(raw) => parse_duration(raw)
            .filter(|d| !d.is_zero())
            .with_context(|| format!("Invalid interval: {}", raw)),
        None => config
            .refresh
            .interval()
            .with_context(|| format!("Invalid interval: {}", config.refresh.interval)),
    }
}

/// Log the toughest shift for one subject per tick, rotating P -> C -> M.
///
/// Ticks half a period out of phase with the refresh loop so each one sees
/// the latest applied snapshot.
async fn spotlight(coordinator: Arc<RefreshCoordinator>, period: Duration) {
    let start = tokio::time::Instant::now() + period / 2;
    let mut ticker = tokio::time::interval_at(start, period);
    let mut subject = Subject::Physics;
    let mut last_token = 0;

    loop {
        ticker.tick().await;

        let state = coordinator.state().await;
        if state.applied_token != last_token {
            last_token = state.applied_token;
            let shifts = coordinator.shifts().await;
            if let Some(overview) = population_overview(&shifts) {
                tracing::info!(
                    shifts = overview.shift_count,
                    candidates = overview.total_candidates,
                    hardest = %overview.hardest_shift,
                    "Snapshot {} ({})",
                    last_token,
                    state.connectivity
                );
            }
        }

        let shifts = coordinator.shifts().await;
        if let Some(shift) = toughest_for(subject, &shifts) {
            tracing::info!(
                "Toughest {} paper: {} (avg {:.1})",
                subject,
                shift.id,
                subject.average(shift)
            );
        }
        subject = subject.next();
    }
}

fn print_summary(shifts: &[ShiftSummary], view: &ViewState) {
    let Some(overview) = population_overview(shifts) else {
        println!("No shifts with enough responses yet.");
        return;
    };
    let selected = view.resolve(shifts).map(|s| s.id.clone());

    println!("\n=== Shift Leaderboard ({:?} order) ===", view.sort);
    println!(
        "  {:<16} {:>7} {:>7} {:>8} {:>7} {:>7} {:>7} {:>7}",
        "Shift", "Count", "Avg", "Median", "SD", "99%ile", "98%ile", "150+%"
    );
    for shift in view.ordered(shifts) {
        let marker = if selected.as_ref() == Some(&shift.id) {
            '*'
        } else {
            ' '
        };
        println!(
            "{} {:<16} {:>7} {:>7.1} {:>8.2} {:>7.2} {:>7.1} {:>7.1} {:>7.2}",
            marker,
            shift.id.to_string(),
            shift.count,
            shift.avg,
            shift.median,
            shift.sd,
            shift.predicted_99,
            shift.predicted_98,
            shift.elite_ratio
        );
    }

    println!("\n=== Overview ===");
    println!("Shifts:           {}", overview.shift_count);
    println!("Candidates:       {}", overview.total_candidates);
    println!("Mean median:      {:.1}", overview.mean_median);
    println!("Scoring 150+:     {:.2}%", overview.global_top_ratio);
    println!(
        "Hardest shift:    {} (avg {:.1}, median {:.2})",
        overview.hardest_shift, overview.hardest_avg, overview.hardest_median
    );

    println!("\n=== Toughest by Subject ===");
    for ranking in subject_rankings(shifts) {
        let entries: Vec<String> = ranking
            .toughest
            .iter()
            .map(|s| format!("{} ({:.1})", s.id, s.average))
            .collect();
        println!("{:<10} {}", ranking.subject.to_string(), entries.join(", "));
    }
}
