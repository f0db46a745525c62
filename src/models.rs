use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One fixed-arity row `(date, v1, v2, ...)` as supplied by the record sources.
pub type TimedRecord = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(i64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value)
    }
}

/// Column-oriented result keyed by name, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyedSeries {
    columns: Vec<(String, Vec<Cell>)>,
}

impl KeyedSeries {
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            columns: keys
                .iter()
                .map(|key| (key.to_string(), Vec::new()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> &mut Vec<Cell> {
        &mut self.columns[index].1
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn columns(&self) -> &[(String, Vec<Cell>)] {
        &self.columns
    }

    /// Number of rows, taken from the leading (date) column.
    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, values)| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for KeyedSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (key, values) in &self.columns {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPopularity {
    pub post_id: String,
    pub mean_likes: f64,
    pub mean_comments: f64,
}

impl PostPopularity {
    pub fn interaction_score(&self) -> f64 {
        self.mean_likes + self.mean_comments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "pos")]
    Positive,
    #[serde(rename = "neu")]
    Neutral,
    #[serde(rename = "neg")]
    Negative,
    #[serde(rename = "none")]
    Unclassified,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "pos",
            Polarity::Neutral => "neu",
            Polarity::Negative => "neg",
            Polarity::Unclassified => "none",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub original_text: String,
    pub sentiment: Polarity,
    pub degree: f64,
}

/// A classified comment as handed to behavior derivation. Fields are optional
/// because upstream rows may be incomplete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorSentiment {
    pub date: Option<String>,
    pub author: Option<String>,
    pub sentiment: Option<Polarity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BehaviorRecord {
    pub date: String,
    pub n_friends: usize,
    pub n_haters: usize,
}

impl BehaviorRecord {
    pub fn into_record(self) -> TimedRecord {
        vec![
            self.date,
            self.n_friends.to_string(),
            self.n_haters.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub author: String,
    pub date: String,
    pub translated_text: String,
    pub original_text: String,
}

impl Comment {
    pub fn text_record(&self) -> TimedRecord {
        vec![
            self.comment_id.clone(),
            self.translated_text.clone(),
            self.original_text.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_series_serializes_in_key_order() {
        let mut series = KeyedSeries::with_keys(&["date", "n_posts"]);
        series.column_mut(0).push(Cell::from("Week 1"));
        series.column_mut(1).push(Cell::from(12));

        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"{"date":["Week 1"],"n_posts":[12]}"#);
    }

    #[test]
    fn missing_keys_are_none() {
        let series = KeyedSeries::with_keys(&["date"]);
        assert!(series.get("likes").is_none());
        assert_eq!(series.get("date"), Some(&[][..]));
        assert!(series.is_empty());
    }

    #[test]
    fn polarity_uses_short_labels() {
        let parsed: Polarity = serde_json::from_str("\"neg\"").unwrap();
        assert_eq!(parsed, Polarity::Negative);
        assert_eq!(Polarity::Unclassified.to_string(), "none");
    }
}
