use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use attendance_backend::domain::record_normalizer::parse_status;
use attendance_backend::{
    AttendanceGrid, AttendanceService, BulkOutcome, CsvAttendanceGateway, CsvConnection,
    DateRangeCalculator, EditOutcome, EngineConfig, NotificationLevel,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::{AttendanceStatus, ChildId, WriteMetadata};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Attendance grid for one class over the trailing days ending at a date
#[derive(Parser)]
#[command(name = "attendance-backend", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./attendance.yaml)
    #[arg(global = true, long = "config")]
    config: Option<PathBuf>,

    /// Override the data directory from the config file
    #[arg(global = true, long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Who the change is attributed to
    #[arg(global = true, long = "by")]
    recorded_by: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grid and per-day counts
    Show {
        #[arg(long)]
        class: String,
        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Set one child's status on the anchor date
    Set {
        #[arg(long)]
        class: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        child: ChildId,
        /// present, absent, late or unrecorded
        #[arg(long, value_parser = parse_status_arg)]
        status: AttendanceStatus,
    },
    /// Advance one child's status to the next in the cycle
    Cycle {
        #[arg(long)]
        class: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        child: ChildId,
    },
    /// Set or clear one child's notes on the anchor date
    Notes {
        #[arg(long)]
        class: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        child: ChildId,
        /// Leave out to clear the notes
        #[arg(long)]
        text: Option<String>,
    },
    /// Mark everyone without a status on the anchor date present
    BulkPresent {
        #[arg(long)]
        class: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    DateRangeCalculator::parse_anchor(value).map_err(|e| e.to_string())
}

fn parse_status_arg(value: &str) -> Result<AttendanceStatus, String> {
    parse_status(value).ok_or_else(|| format!("unknown status '{}'", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow!("invalid RUST_LOG filter: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(attendance_backend::config::CONFIG_FILE_NAME));
    let mut config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_directory = dir;
    }

    info!("📁 Using data directory {}", config.data_directory.display());
    let connection = CsvConnection::new(&config.data_directory)?;
    let gateway = Arc::new(CsvAttendanceGateway::new(connection));
    let service = AttendanceService::from_config(gateway, &config)?;

    let metadata = match cli.recorded_by.clone().or_else(|| config.recorded_by.clone()) {
        Some(name) => WriteMetadata::recorded_by(name),
        None => WriteMetadata::default(),
    };
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Show { class, date } => {
            service.load(&class, date.unwrap_or(today)).await?;
        }
        Commands::Set {
            class,
            date,
            child,
            status,
        } => {
            service.load(&class, date.unwrap_or(today)).await?;
            let outcome = service.set_status(child, status, metadata).await?;
            print_outcome(&format!("child {} set to {}", child, status), &outcome);
        }
        Commands::Cycle { class, date, child } => {
            service.load(&class, date.unwrap_or(today)).await?;
            let (status, outcome) = service.cycle_status(child, metadata).await?;
            print_outcome(&format!("child {} cycled to {}", child, status), &outcome);
        }
        Commands::Notes {
            class,
            date,
            child,
            text,
        } => {
            service.load(&class, date.unwrap_or(today)).await?;
            let outcome = service.set_notes(child, text, metadata).await?;
            print_outcome(&format!("notes for child {} saved", child), &outcome);
        }
        Commands::BulkPresent { class, date } => {
            service.load(&class, date.unwrap_or(today)).await?;
            match service.bulk_present(metadata).await? {
                BulkOutcome::NothingToMark => println!("Everyone already has a status"),
                BulkOutcome::Marked { requested, marked } => {
                    println!("Marked {} of {} children present", marked, requested)
                }
                BulkOutcome::Failed { reason, .. } => println!("Bulk present failed: {}", reason),
            }
        }
    }

    let grid = service.grid_snapshot().await?;
    print_grid(&grid);

    for notification in service.active_notifications().await {
        let tag = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        println!("[{}] {}", tag, notification.message);
    }

    Ok(())
}

fn print_outcome(action: &str, outcome: &EditOutcome) {
    match outcome {
        EditOutcome::Confirmed => println!("✅ {}", action),
        EditOutcome::RolledBack { reason, .. } => println!("❌ Not saved: {}", reason),
        EditOutcome::Superseded { reason } => println!("⚠️ Superseded: {}", reason),
    }
}

fn print_grid(grid: &AttendanceGrid) {
    let dates = grid.window().dates();

    print!("{:<24}", "");
    for date in dates {
        print!("{:>12}", date.format("%a %m-%d").to_string());
    }
    println!();

    for row in grid.rows() {
        print!("{:<24}", truncate(&row.child.name, 23));
        for cell in &row.cells {
            let mark = if cell.notes.is_some() {
                format!("{}*", cell.status)
            } else {
                cell.status.to_string()
            };
            print!("{:>12}", mark);
        }
        println!();
    }

    println!();
    for summary in grid.summaries() {
        println!(
            "{}: {} present, {} absent, {} late, {} unrecorded",
            summary.date, summary.present, summary.absent, summary.late, summary.unrecorded
        );
    }
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        name.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}
