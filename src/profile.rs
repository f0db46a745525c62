use crate::bucket;
use crate::error::{check_username, AnalysisError, Result};
use crate::models::{KeyedSeries, TimedRecord};

pub const PROFILE_KEYS: [&str; 4] = ["date", "n_posts", "n_followers", "n_followings"];
pub const ACTIVITY_KEYS: [&str; 2] = ["date", "n_posts"];

/// Posts, followers and followings over time for one account.
pub fn profile_evolution(username: &str, records: &[TimedRecord]) -> Result<KeyedSeries> {
    series_for(username, records, &PROFILE_KEYS, "profile_evolution")
}

/// Post count over time for one account.
pub fn user_activity(username: &str, records: &[TimedRecord]) -> Result<KeyedSeries> {
    series_for(username, records, &ACTIVITY_KEYS, "user_activity")
}

fn series_for(
    username: &str,
    records: &[TimedRecord],
    keys: &[&str],
    operation: &'static str,
) -> Result<KeyedSeries> {
    check_username(username)?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput(operation));
    }
    bucket::check_arity(records, keys.len())?;
    bucket::bucket(records, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn snapshot(day: u32, posts: i64, followers: i64, followings: i64) -> TimedRecord {
        vec![
            format!("2024-05-{day:02}"),
            posts.to_string(),
            followers.to_string(),
            followings.to_string(),
        ]
    }

    #[test]
    fn short_history_is_returned_unaveraged() {
        let records: Vec<TimedRecord> = (1..=4)
            .map(|day| snapshot(day, 10 + day as i64, 500, 80))
            .collect();
        let series = profile_evolution("u", &records).unwrap();

        assert_eq!(series.keys().collect::<Vec<_>>(), PROFILE_KEYS.to_vec());
        for key in PROFILE_KEYS {
            assert_eq!(series.get(key).unwrap().len(), 4);
        }
        assert_eq!(series.get("date").unwrap()[0], Cell::from("2024-05-01"));
        assert_eq!(series.get("n_posts").unwrap()[3], Cell::from("14"));
    }

    #[test]
    fn long_history_is_grouped_by_week() {
        let records: Vec<TimedRecord> = (1..=12)
            .map(|day| snapshot(day, day as i64, 1000 + day as i64, 50))
            .collect();
        let series = profile_evolution("u", &records).unwrap();

        assert_eq!(
            series.get("date").unwrap(),
            &[Cell::from("Week 1"), Cell::from("Week 2")]
        );
        // 1..=7 -> 4, 8..=12 -> 10
        assert_eq!(
            series.get("n_posts").unwrap(),
            &[Cell::Number(4), Cell::Number(10)]
        );
        assert_eq!(
            series.get("n_followers").unwrap(),
            &[Cell::Number(1004), Cell::Number(1010)]
        );
        assert_eq!(
            series.get("n_followings").unwrap(),
            &[Cell::Number(50), Cell::Number(50)]
        );
    }

    #[test]
    fn activity_uses_two_columns() {
        let records = vec![
            vec!["2024-05-01".to_string(), "3".to_string()],
            vec!["2024-05-02".to_string(), "4".to_string()],
        ];
        let series = user_activity("u", &records).unwrap();
        assert_eq!(series.keys().collect::<Vec<_>>(), ACTIVITY_KEYS.to_vec());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn username_is_checked_before_records() {
        let bad_records = vec![vec!["2024-05-01".to_string()]];
        assert!(matches!(
            profile_evolution("", &bad_records),
            Err(AnalysisError::Username)
        ));
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert!(matches!(
            user_activity("u", &[]),
            Err(AnalysisError::EmptyInput("user_activity"))
        ));
    }

    #[test]
    fn one_bad_row_fails_the_batch() {
        let mut records: Vec<TimedRecord> = (1..=9).map(|day| snapshot(day, 1, 1, 1)).collect();
        records[8].pop();
        assert!(matches!(
            profile_evolution("u", &records),
            Err(AnalysisError::ArityMismatch { index: 8, .. })
        ));
    }
}
