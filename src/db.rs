use anyhow::Context;
use chrono::NaiveDate;
use clap::ValueEnum;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Comment, TimedRecord};

/// Inclusive date range applied to every fetch. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateWindow {
    pub fn label(&self) -> String {
        match (self.since, self.until) {
            (Some(since), Some(until)) => format!("{since} to {until}"),
            (Some(since), None) => format!("since {since}"),
            (None, Some(until)) => format!("until {until}"),
            (None, None) => "all recorded dates".to_string(),
        }
    }
}

/// The record batches the analyzers consume, with their column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Profile,
    Activity,
    PostEvolution,
    PostPopularity,
}

impl RecordKind {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Profile => &["date", "n_posts", "n_followers", "n_followings"],
            RecordKind::Activity => &["date", "n_posts"],
            RecordKind::PostEvolution => &["date", "likes", "comments"],
            RecordKind::PostPopularity => &["post_id", "likes", "comments"],
        }
    }

    fn query(&self) -> &'static str {
        match self {
            RecordKind::Profile => {
                "SELECT captured_on::text, n_posts::text, n_followers::text, n_followings::text \
                 FROM social_insights.profile_snapshots \
                 WHERE username = $1 \
                 AND ($2::date IS NULL OR captured_on >= $2) \
                 AND ($3::date IS NULL OR captured_on <= $3) \
                 ORDER BY captured_on"
            }
            RecordKind::Activity => {
                "SELECT captured_on::text, n_posts::text \
                 FROM social_insights.profile_snapshots \
                 WHERE username = $1 \
                 AND ($2::date IS NULL OR captured_on >= $2) \
                 AND ($3::date IS NULL OR captured_on <= $3) \
                 ORDER BY captured_on"
            }
            RecordKind::PostEvolution => {
                "SELECT posted_on::text, likes::text, comments::text \
                 FROM social_insights.post_interactions \
                 WHERE username = $1 \
                 AND ($2::date IS NULL OR posted_on >= $2) \
                 AND ($3::date IS NULL OR posted_on <= $3) \
                 ORDER BY posted_on"
            }
            RecordKind::PostPopularity => {
                "SELECT post_id, likes::text, comments::text \
                 FROM social_insights.post_interactions \
                 WHERE username = $1 \
                 AND ($2::date IS NULL OR posted_on >= $2) \
                 AND ($3::date IS NULL OR posted_on <= $3) \
                 ORDER BY posted_on, post_id"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportKind {
    Profile,
    Posts,
    Comments,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_records(
    pool: &PgPool,
    kind: RecordKind,
    username: &str,
    window: DateWindow,
) -> anyhow::Result<Vec<TimedRecord>> {
    let rows = sqlx::query(kind.query())
        .bind(username)
        .bind(window.since)
        .bind(window.until)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to fetch {kind:?} records for {username}"))?;

    let width = kind.columns().len();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = Vec::with_capacity(width);
        for index in 0..width {
            record.push(row.try_get::<String, _>(index)?);
        }
        records.push(record);
    }

    debug!(?kind, username, count = records.len(), "fetched records");
    Ok(records)
}

pub async fn fetch_comments(
    pool: &PgPool,
    username: &str,
    window: DateWindow,
) -> anyhow::Result<Vec<Comment>> {
    let rows = sqlx::query(
        "SELECT comment_id, author, posted_on::text AS date, translated_text, original_text \
         FROM social_insights.comments \
         WHERE username = $1 \
         AND ($2::date IS NULL OR posted_on >= $2) \
         AND ($3::date IS NULL OR posted_on <= $3) \
         ORDER BY posted_on, comment_id",
    )
    .bind(username)
    .bind(window.since)
    .bind(window.until)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to fetch comments for {username}"))?;

    let comments: Vec<Comment> = rows
        .into_iter()
        .map(|row| Comment {
            comment_id: row.get("comment_id"),
            author: row.get("author"),
            date: row.get("date"),
            translated_text: row.get("translated_text"),
            original_text: row.get("original_text"),
        })
        .collect();

    debug!(username, count = comments.len(), "fetched comments");
    Ok(comments)
}

pub async fn import_csv(
    pool: &PgPool,
    kind: ImportKind,
    username: &str,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let inserted = match kind {
        ImportKind::Profile => import_profile(pool, username, csv_path).await?,
        ImportKind::Posts => import_posts(pool, username, csv_path).await?,
        ImportKind::Comments => import_comments(pool, username, csv_path).await?,
    };
    info!(?kind, username, inserted, path = %csv_path.display(), "import finished");
    Ok(inserted)
}

fn source_key(provided: Option<String>) -> String {
    provided
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()))
}

async fn import_profile(
    pool: &PgPool,
    username: &str,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        date: NaiveDate,
        n_posts: i32,
        n_followers: i32,
        n_followings: i32,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let result = sqlx::query(
            r#"
            INSERT INTO social_insights.profile_snapshots
            (id, username, captured_on, n_posts, n_followers, n_followings, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(row.date)
        .bind(row.n_posts)
        .bind(row.n_followers)
        .bind(row.n_followings)
        .bind(source_key(row.source_key))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

async fn import_posts(
    pool: &PgPool,
    username: &str,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        post_id: String,
        date: NaiveDate,
        likes: i32,
        comments: i32,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let result = sqlx::query(
            r#"
            INSERT INTO social_insights.post_interactions
            (id, username, post_id, posted_on, likes, comments, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(&row.post_id)
        .bind(row.date)
        .bind(row.likes)
        .bind(row.comments)
        .bind(source_key(row.source_key))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

async fn import_comments(
    pool: &PgPool,
    username: &str,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        comment_id: String,
        author: String,
        date: NaiveDate,
        translated_text: String,
        original_text: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let result = sqlx::query(
            r#"
            INSERT INTO social_insights.comments
            (id, username, comment_id, author, posted_on, translated_text, original_text, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(&row.comment_id)
        .bind(&row.author)
        .bind(row.date)
        .bind(&row.translated_text)
        .bind(&row.original_text)
        .bind(source_key(row.source_key))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_labels_describe_bounds() {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        assert_eq!(DateWindow::default().label(), "all recorded dates");
        assert_eq!(
            DateWindow {
                since: Some(since),
                until: Some(until)
            }
            .label(),
            "2024-01-01 to 2024-01-31"
        );
        assert_eq!(
            DateWindow {
                since: Some(since),
                until: None
            }
            .label(),
            "since 2024-01-01"
        );
    }

    #[test]
    fn queries_select_one_column_per_key() {
        for kind in [
            RecordKind::Profile,
            RecordKind::Activity,
            RecordKind::PostEvolution,
            RecordKind::PostPopularity,
        ] {
            let select = kind.query().split(" FROM ").next().unwrap();
            assert_eq!(select.matches(',').count() + 1, kind.columns().len());
        }
    }

    #[test]
    fn generated_source_keys_are_unique() {
        assert_eq!(source_key(Some("seed-001".to_string())), "seed-001");
        let first = source_key(None);
        let second = source_key(Some(" ".to_string()));
        assert!(first.starts_with("import-"));
        assert_ne!(first, second);
    }
}
