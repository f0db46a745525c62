use std::collections::HashMap;

use crate::bucket;
use crate::error::{check_username, AnalysisError, Result};
use crate::models::{
    AuthorSentiment, BehaviorRecord, Comment, KeyedSeries, Polarity, SentimentResult, TimedRecord,
};

pub const BEHAVIOR_KEYS: [&str; 3] = ["date", "n_friends", "n_haters"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolarityCounts {
    pub pos: usize,
    pub neu: usize,
    pub neg: usize,
}

impl PolarityCounts {
    fn record(&mut self, sentiment: Polarity) {
        match sentiment {
            Polarity::Positive => self.pos += 1,
            Polarity::Neutral => self.neu += 1,
            Polarity::Negative => self.neg += 1,
            Polarity::Unclassified => {}
        }
    }

    /// Most frequent label, preferring pos, then neu, then neg on ties.
    /// `None` when nothing was counted.
    pub fn dominant(&self) -> Option<Polarity> {
        if self.pos == 0 && self.neu == 0 && self.neg == 0 {
            None
        } else if self.pos >= self.neu && self.pos >= self.neg {
            Some(Polarity::Positive)
        } else if self.neu >= self.neg {
            Some(Polarity::Neutral)
        } else {
            Some(Polarity::Negative)
        }
    }
}

/// `date -> author -> counts`, dates in first-seen order.
#[derive(Debug, Default)]
pub struct BehaviorTable {
    dates: Vec<(String, HashMap<String, PolarityCounts>)>,
    positions: HashMap<String, usize>,
}

impl BehaviorTable {
    pub fn add(&mut self, date: &str, author: &str, sentiment: Polarity) {
        let position = match self.positions.get(date) {
            Some(position) => *position,
            None => {
                self.dates.push((date.to_string(), HashMap::new()));
                self.positions.insert(date.to_string(), self.dates.len() - 1);
                self.dates.len() - 1
            }
        };
        self.dates[position]
            .1
            .entry(author.to_string())
            .or_default()
            .record(sentiment);
    }

    #[cfg(test)]
    fn counts(&self, date: &str, author: &str) -> Option<PolarityCounts> {
        let position = self.positions.get(date)?;
        self.dates[*position].1.get(author).copied()
    }

    pub fn summarize(&self) -> Vec<BehaviorRecord> {
        self.dates
            .iter()
            .map(|(date, authors)| {
                let mut record = BehaviorRecord {
                    date: date.clone(),
                    n_friends: 0,
                    n_haters: 0,
                };
                for counts in authors.values() {
                    match counts.dominant() {
                        Some(Polarity::Positive) => record.n_friends += 1,
                        Some(Polarity::Negative) => record.n_haters += 1,
                        _ => {}
                    }
                }
                record
            })
            .collect()
    }
}

/// Friends and haters per date, in first-seen date order.
pub fn behavior_counts(username: &str, records: &[AuthorSentiment]) -> Result<Vec<BehaviorRecord>> {
    check_username(username)?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput("derive_behavior"));
    }

    let mut table = BehaviorTable::default();
    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let missing = |field| AnalysisError::SentimentRecord { index, field };
        let date = record.date.as_deref().ok_or_else(|| missing("date"))?;
        let author = record.author.as_deref().ok_or_else(|| missing("author"))?;
        let sentiment = record.sentiment.ok_or_else(|| missing("sentiment"))?;
        rows.push((date, author, sentiment));
    }
    for (date, author, sentiment) in rows {
        table.add(date, author, sentiment);
    }

    Ok(table.summarize())
}

/// Join classified texts back to the comments they came from. Both slices are
/// in the same order, as `classify` preserves input order.
pub fn author_sentiments(comments: &[Comment], results: &[SentimentResult]) -> Vec<AuthorSentiment> {
    comments
        .iter()
        .zip(results)
        .map(|(comment, result)| AuthorSentiment {
            date: Some(comment.date.clone()),
            author: Some(comment.author.clone()),
            sentiment: Some(result.sentiment),
        })
        .collect()
}

/// Friend/hater series, bucketed daily or weekly like the profile series.
pub fn derive_behavior(username: &str, records: &[AuthorSentiment]) -> Result<KeyedSeries> {
    let daily: Vec<TimedRecord> = behavior_counts(username, records)?
        .into_iter()
        .map(BehaviorRecord::into_record)
        .collect();
    bucket::bucket(&daily, &BEHAVIOR_KEYS)
}
