use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("username must be a non-empty string")]
    Username,
    #[error("{0} received an empty collection")]
    EmptyInput(&'static str),
    #[error("records must be a non-empty sequence of tuples")]
    Values,
    #[error("keys must be a non-empty list of distinct, non-empty names: {0}")]
    Keys(String),
    #[error("record {index} has {found} fields but {expected} keys were declared")]
    ArityMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("text record {index} has {found} fields, expected (id, translated_text, original_text)")]
    TextShape { index: usize, found: usize },
    #[error("sentiment record {index} is missing `{field}`")]
    SentimentRecord { index: usize, field: &'static str },
    #[error("value {value:?} under key `{key}` is not an integer")]
    NotAnInteger { key: String, value: String },
    #[error("cannot read sentiment model at {path}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sentiment model at {path}: {reason}")]
    ModelFormat { path: PathBuf, reason: String },
    #[error("sentiment model produced unknown label {0:?}")]
    UnknownLabel(String),
}

pub fn check_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AnalysisError::Username);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_usernames_are_rejected() {
        assert!(matches!(check_username(""), Err(AnalysisError::Username)));
        assert!(matches!(check_username("   "), Err(AnalysisError::Username)));
        assert!(check_username("studied_account").is_ok());
    }
}
