use std::collections::{BTreeMap, HashMap};

use clap::ValueEnum;

use crate::bucket::{self, parse_count, rounded_mean};
use crate::error::{check_username, AnalysisError, Result};
use crate::models::{KeyedSeries, PostPopularity, TimedRecord};

pub const POST_KEYS: [&str; 3] = ["date", "likes", "comments"];
pub const POPULARITY_KEYS: [&str; 3] = ["post_id", "likes", "comments"];

/// How many posts the dashboard shows in a best/worst ranking.
pub const TOP_POSTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PopularityMode {
    Best,
    Worst,
}

/// Mean likes and comments per distinct date, dates ascending, then bucketed.
pub fn post_evolution(username: &str, records: &[TimedRecord]) -> Result<KeyedSeries> {
    check_username(username)?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput("post_evolution"));
    }
    bucket::check_arity(records, POST_KEYS.len())?;

    let mut by_date: BTreeMap<&str, (Vec<i64>, Vec<i64>)> = BTreeMap::new();
    for record in records {
        let likes = parse_count(POST_KEYS[1], &record[1])?;
        let comments = parse_count(POST_KEYS[2], &record[2])?;
        let entry = by_date.entry(record[0].as_str()).or_default();
        entry.0.push(likes);
        entry.1.push(comments);
    }

    let daily: Vec<TimedRecord> = by_date
        .into_iter()
        .map(|(date, (likes, comments))| {
            vec![
                date.to_string(),
                rounded_mean(&likes).to_string(),
                rounded_mean(&comments).to_string(),
            ]
        })
        .collect();

    bucket::bucket(&daily, &POST_KEYS)
}

/// Mean likes and comments per post id, in order of first appearance.
pub fn post_popularity(username: &str, records: &[TimedRecord]) -> Result<Vec<PostPopularity>> {
    check_username(username)?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput("post_popularity"));
    }
    bucket::check_arity(records, POPULARITY_KEYS.len())?;

    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (i128, i128, usize)> = HashMap::new();

    for record in records {
        let likes = parse_count(POPULARITY_KEYS[1], &record[1])?;
        let comments = parse_count(POPULARITY_KEYS[2], &record[2])?;
        let entry = totals.entry(record[0].as_str()).or_insert_with(|| {
            order.push(record[0].as_str());
            (0, 0, 0)
        });
        entry.0 += likes as i128;
        entry.1 += comments as i128;
        entry.2 += 1;
    }

    Ok(order
        .into_iter()
        .map(|post_id| {
            let (likes, comments, count) = totals[post_id];
            PostPopularity {
                post_id: post_id.to_string(),
                mean_likes: likes as f64 / count as f64,
                mean_comments: comments as f64 / count as f64,
            }
        })
        .collect())
}

/// Caller-side ranking by combined interactions. Ties keep first-seen order.
pub fn rank_popularity(
    posts: &[PostPopularity],
    mode: PopularityMode,
    limit: usize,
) -> Vec<PostPopularity> {
    let mut ranked = posts.to_vec();
    ranked.sort_by(|a, b| {
        let ordering = a
            .interaction_score()
            .partial_cmp(&b.interaction_score())
            .unwrap_or(std::cmp::Ordering::Equal);
        match mode {
            PopularityMode::Best => ordering.reverse(),
            PopularityMode::Worst => ordering,
        }
    });
    ranked.truncate(limit);
    ranked
}
