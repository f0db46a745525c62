//! Temporal analytics and sentiment classification for a studied social
//! media account: daily or weekly series, post popularity, comment polarity
//! and the friend/hater counts derived from it.

pub mod behavior;
pub mod bucket;
pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod interactions;
pub mod models;
pub mod profile;
pub mod report;
pub mod sentiment;

pub use error::{AnalysisError, Result};
