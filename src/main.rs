use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use social_insights::behavior::{author_sentiments, derive_behavior};
use social_insights::config::Settings;
use social_insights::db::{self, DateWindow, ImportKind, RecordKind};
use social_insights::input;
use social_insights::interactions::{
    post_evolution, post_popularity, rank_popularity, PopularityMode, TOP_POSTS,
};
use social_insights::models::{Comment, SentimentResult, TimedRecord};
use social_insights::profile::{profile_evolution, user_activity};
use social_insights::report::{self, ReportInputs};
use social_insights::sentiment::{self, Lexicon, ModelHandle};

#[derive(Parser)]
#[command(name = "social-insights")]
#[command(about = "Temporal analytics and comment sentiment for a studied account", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct Source {
    /// Account under study
    #[arg(long)]
    username: String,
    /// Read records from a CSV file instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long, conflicts_with = "csv")]
    since: Option<NaiveDate>,
    #[arg(long, conflicts_with = "csv")]
    until: Option<NaiveDate>,
}

impl Source {
    fn window(&self) -> DateWindow {
        DateWindow {
            since: self.since,
            until: self.until,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import profile snapshots, post interactions or comments from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        #[arg(long)]
        username: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Posts, followers and followings over time
    Profile {
        #[command(flatten)]
        source: Source,
    },
    /// Post count over time
    Activity {
        #[command(flatten)]
        source: Source,
    },
    /// Mean likes and comments per date
    Posts {
        #[command(flatten)]
        source: Source,
    },
    /// Rank posts by mean interactions
    Popularity {
        #[command(flatten)]
        source: Source,
        #[arg(long, value_enum, default_value_t = PopularityMode::Best)]
        mode: PopularityMode,
        #[arg(long, default_value_t = TOP_POSTS)]
        limit: usize,
    },
    /// Classify comment polarity
    Sentiment {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Friends and haters over time
    Behavior {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Generate a markdown report from Postgres
    Report {
        #[arg(long)]
        username: String,
        #[arg(long)]
        since: Option<NaiveDate>,
        #[arg(long)]
        until: Option<NaiveDate>,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&settings).await?;
            db::init_db(&pool).await?;
            info!("schema ready");
        }
        Commands::Import {
            kind,
            username,
            csv,
        } => {
            let pool = connect(&settings).await?;
            let inserted = db::import_csv(&pool, kind, &username, &csv).await?;
            println!("Inserted {inserted} rows from {}.", csv.display());
        }
        Commands::Profile { source } => {
            let records = load_records(&settings, &source, RecordKind::Profile).await?;
            print_json(&profile_evolution(&source.username, &records)?)?;
        }
        Commands::Activity { source } => {
            let records = load_records(&settings, &source, RecordKind::Activity).await?;
            print_json(&user_activity(&source.username, &records)?)?;
        }
        Commands::Posts { source } => {
            let records = load_records(&settings, &source, RecordKind::PostEvolution).await?;
            print_json(&post_evolution(&source.username, &records)?)?;
        }
        Commands::Popularity {
            source,
            mode,
            limit,
        } => {
            let records = load_records(&settings, &source, RecordKind::PostPopularity).await?;
            let posts = post_popularity(&source.username, &records)?;
            print_json(&rank_popularity(&posts, mode, limit))?;
        }
        Commands::Sentiment { source, model } => {
            let handle = ModelHandle::new(settings.clone().with_model_path(model).model_path);
            let comments = load_comments(&settings, &source).await?;
            print_json(&classify_comments(&source.username, &comments, &handle)?)?;
        }
        Commands::Behavior { source, model } => {
            let handle = ModelHandle::new(settings.clone().with_model_path(model).model_path);
            let comments = load_comments(&settings, &source).await?;
            let results = classify_comments(&source.username, &comments, &handle)?;
            let records = author_sentiments(&comments, &results);
            print_json(&derive_behavior(&source.username, &records)?)?;
        }
        Commands::Report {
            username,
            since,
            until,
            model,
            out,
        } => {
            let window = DateWindow { since, until };
            let handle = ModelHandle::new(settings.clone().with_model_path(model).model_path);
            let pool = connect(&settings).await?;

            let profile_records =
                db::fetch_records(&pool, RecordKind::Profile, &username, window).await?;
            let post_records =
                db::fetch_records(&pool, RecordKind::PostEvolution, &username, window).await?;
            let popularity_records =
                db::fetch_records(&pool, RecordKind::PostPopularity, &username, window).await?;
            let comments = db::fetch_comments(&pool, &username, window).await?;

            let profile = non_empty(&profile_records, |records| {
                profile_evolution(&username, records)
            })?;
            let posts = non_empty(&post_records, |records| post_evolution(&username, records))?;
            let top_posts = match non_empty(&popularity_records, |records| {
                post_popularity(&username, records)
            })? {
                Some(posts) => rank_popularity(&posts, PopularityMode::Best, TOP_POSTS),
                None => Vec::new(),
            };
            let behavior = if comments.is_empty() {
                None
            } else {
                let results = classify_comments(&username, &comments, &handle)?;
                Some(derive_behavior(
                    &username,
                    &author_sentiments(&comments, &results),
                )?)
            };

            let report = report::build_report(
                &username,
                &window.label(),
                &ReportInputs {
                    profile: profile.as_ref(),
                    posts: posts.as_ref(),
                    top_posts: &top_posts,
                    behavior: behavior.as_ref(),
                },
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(settings.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

async fn load_records(
    settings: &Settings,
    source: &Source,
    kind: RecordKind,
) -> anyhow::Result<Vec<TimedRecord>> {
    match &source.csv {
        Some(path) => input::read_columns(path, kind.columns()),
        None => {
            let pool = connect(settings).await?;
            db::fetch_records(&pool, kind, &source.username, source.window()).await
        }
    }
}

async fn load_comments(settings: &Settings, source: &Source) -> anyhow::Result<Vec<Comment>> {
    match &source.csv {
        Some(path) => input::read_comments(path),
        None => {
            let pool = connect(settings).await?;
            db::fetch_comments(&pool, &source.username, source.window()).await
        }
    }
}

fn classify_comments(
    username: &str,
    comments: &[Comment],
    handle: &ModelHandle,
) -> anyhow::Result<Vec<SentimentResult>> {
    let texts: Vec<TimedRecord> = comments.iter().map(Comment::text_record).collect();
    if !handle.is_loaded() {
        info!(path = %handle.path().display(), "loading sentiment model");
    }
    let model = handle
        .get()
        .with_context(|| format!("sentiment model unavailable at {}", handle.path().display()))?;
    let results = sentiment::classify(username, &texts, model, &Lexicon::default())?;
    info!(username, classified = results.len(), "comments classified");
    Ok(results)
}

fn non_empty<T>(
    records: &[TimedRecord],
    analyze: impl FnOnce(&[TimedRecord]) -> social_insights::Result<T>,
) -> anyhow::Result<Option<T>> {
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(analyze(records)?))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
