//! Emotrack CLI
//!
//! Command-line interface for emotion tracking:
//! - Log an emotion entry
//! - Show statistics for a day, week, month or year
//! - List the entries of a window
//! - Generate a config file

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use emotrack::config::{generate_default_config, Config, LoggingConfig, SourceKind};
use emotrack::dashboard::StatsDashboard;
use emotrack::emotion::{parse_timestamp, EmotionCategory, EmotionEntry, TimeSelection, UserId};
use emotrack::source::{self, CsvSource, EntrySource};
use emotrack::stats::StatisticsSummary;

#[derive(Parser)]
#[command(name = "emotrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track emotional well-being and summarise it for caregivers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Read entries from this CSV file instead of the configured source
    #[arg(long, global = true)]
    pub csv: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an emotion entry in a CSV file
    Log {
        /// User the entry belongs to
        #[arg(short, long)]
        user: String,
        /// Emotion (happy, sad, angry, scared, surprised, calm, tired)
        category: String,
        /// Rating from 0 to 5
        rating: u8,
        /// Optional comment
        #[arg(long)]
        comment: Option<String>,
        /// Optional photo URI
        #[arg(long)]
        photo: Option<String>,
        /// Timestamp (default: now). RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD"
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Show statistics for a user
    Summary {
        #[arg(short, long)]
        user: String,
        /// Window: YYYY-MM-DD, YYYY-Www, YYYY-MM or YYYY (default: configured window containing today)
        #[arg(short, long)]
        select: Option<String>,
    },

    /// List the entries of a window
    Entries {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        select: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(csv) = &cli.csv {
        config.source.kind = SourceKind::Csv;
        config.source.csv_path = Some(csv.clone());
    }

    init_logging(&config.logging);
    tracing::debug!("Emotrack v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Log {
            user,
            category,
            rating,
            comment,
            photo,
            time,
        } => {
            if config.source.kind != SourceKind::Csv {
                anyhow::bail!(
                    "`log` records to a CSV file but the configured source is {:?}; pass --csv or set source.kind = \"csv\"",
                    config.source.kind
                );
            }
            let path = config
                .source
                .csv_path
                .clone()
                .context("no CSV file configured; pass --csv")?;

            let category: EmotionCategory = category.parse()?;
            let timestamp = match time.as_deref() {
                None | Some("now") => Utc::now(),
                Some(s) => parse_timestamp(s)?,
            };

            let mut entry = EmotionEntry::with_timestamp(UserId::from(user), category, rating, timestamp)?;
            entry.comment = comment;
            entry.photo_ref = photo;

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            CsvSource::new(&path).append(&entry)?;

            println!(
                "Logged {} ({}) for {} at {}",
                entry.category,
                entry.rating,
                entry.owner_id,
                entry.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
            );
        }

        Commands::Summary { user, select } => {
            let source = source::from_config(&config.source)?;
            let selection = resolve_selection(select.as_deref(), &config)?;
            let dashboard = load_dashboard(source, &UserId::from(user), selection, &config).await;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(dashboard.summary())?),
                OutputFormat::Table => print_summary(&dashboard.selection(), dashboard.summary()),
            }
        }

        Commands::Entries { user, select } => {
            let source = source::from_config(&config.source)?;
            let selection = resolve_selection(select.as_deref(), &config)?;
            let dashboard = load_dashboard(source, &UserId::from(user), selection, &config).await;
            let entries = dashboard.visible_entries();

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Table => print_entries(&entries),
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, &content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("emotrack={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_selection(select: Option<&str>, config: &Config) -> anyhow::Result<TimeSelection> {
    match select {
        Some(s) => Ok(s.parse()?),
        None => Ok(config
            .dashboard
            .default_window
            .selection_for(Utc::now().date_naive())),
    }
}

/// Load the user's history into a dashboard, reporting a failed load on stderr
async fn load_dashboard(
    source: Arc<dyn EntrySource>,
    user: &UserId,
    selection: TimeSelection,
    config: &Config,
) -> StatsDashboard {
    let mut dashboard = StatsDashboard::with_selection(&config.dashboard, selection);
    if dashboard.load(&*source, user).await.is_err() {
        if let Some(message) = dashboard.error_message() {
            eprintln!("{}", message);
        }
    }
    dashboard
}

fn print_summary(selection: &TimeSelection, summary: &StatisticsSummary) {
    println!("Window: {}", selection);
    println!();
    println!("{:<18} {}", "Entries", summary.count);
    println!("{:<18} {:.2}", "Average rating", summary.average_rating);
    println!(
        "{:<18} {}",
        "Most frequent",
        if summary.modal_label().is_empty() { "-" } else { summary.modal_label() }
    );
    println!("{:<18} {}", "Last 7 days", summary.trailing_week_count);

    let trend: Vec<String> = summary.recent_trend.iter().map(|r| r.to_string()).collect();
    println!(
        "{:<18} {}",
        "Recent trend",
        if trend.is_empty() { "-".to_string() } else { trend.join(" → ") }
    );

    if !summary.distribution.is_empty() {
        println!();
        println!("{:<12} {:>8}", "Emotion", "Share");
        println!("{}", "-".repeat(21));
        for (category, share) in &summary.distribution {
            println!("{:<12} {:>7.1}%", category.label(), share * 100.0);
        }
    }
}

fn print_entries(entries: &[&EmotionEntry]) {
    if entries.is_empty() {
        println!("No entries in this window.");
        return;
    }

    println!("{:<22} {:<10} {:>6}  {}", "Time", "Emotion", "Rating", "Comment");
    println!("{}", "-".repeat(60));
    for entry in entries {
        println!(
            "{:<22} {:<10} {:>6}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.category.label(),
            entry.rating,
            entry.comment.as_deref().unwrap_or("")
        );
    }
}
