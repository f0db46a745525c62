use std::collections::HashSet;

use crate::error::{AnalysisError, Result};
use crate::models::{Cell, KeyedSeries, TimedRecord};

/// Records per weekly bucket, and the threshold above which series are averaged.
pub const DAYS_PER_WEEK: usize = 7;

/// Transpose records into one column per key, values kept verbatim.
pub fn bucket_one_week(records: &[TimedRecord], keys: &[&str]) -> Result<KeyedSeries> {
    validate(records, keys)?;

    let mut series = KeyedSeries::with_keys(keys);
    for record in records {
        for (index, value) in record.iter().enumerate() {
            series.column_mut(index).push(Cell::Text(value.clone()));
        }
    }
    Ok(series)
}

/// Average every non-date column over consecutive chunks of seven records and
/// relabel the date column `Week 1`, `Week 2`, ...
pub fn bucket_many_weeks(records: &[TimedRecord], keys: &[&str]) -> Result<KeyedSeries> {
    let daily = bucket_one_week(records, keys)?;

    let mut weekly = KeyedSeries::with_keys(keys);
    let mut week_count = records.len().div_ceil(DAYS_PER_WEEK);

    for (index, (key, values)) in daily.columns().iter().enumerate().skip(1) {
        let numbers = values
            .iter()
            .map(|cell| parse_count(key, &cell.to_string()))
            .collect::<Result<Vec<i64>>>()?;

        let averages: Vec<Cell> = numbers
            .chunks(DAYS_PER_WEEK)
            .map(|week| Cell::Number(rounded_mean(week)))
            .collect();

        if index == 1 {
            week_count = averages.len();
        }
        *weekly.column_mut(index) = averages;
    }

    *weekly.column_mut(0) = (1..=week_count)
        .map(|week| Cell::Text(format!("Week {week}")))
        .collect();
    Ok(weekly)
}

/// Pick the daily or weekly view depending on how many records there are.
pub fn bucket(records: &[TimedRecord], keys: &[&str]) -> Result<KeyedSeries> {
    if records.len() <= DAYS_PER_WEEK {
        bucket_one_week(records, keys)
    } else {
        bucket_many_weeks(records, keys)
    }
}

/// Arithmetic mean rounded half to even, computed on the exact integer sum.
pub fn rounded_mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let sum: i128 = values.iter().map(|value| *value as i128).sum();
    let count = values.len() as i128;

    let quotient = sum.div_euclid(count);
    let twice_remainder = sum.rem_euclid(count) * 2;
    let rounded = match twice_remainder.cmp(&count) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 == 0 => quotient,
        std::cmp::Ordering::Equal => quotient + 1,
    };
    rounded as i64
}

pub fn parse_count(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AnalysisError::NotAnInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
}

pub(crate) fn check_arity(records: &[TimedRecord], expected: usize) -> Result<()> {
    match records
        .iter()
        .enumerate()
        .find(|(_, record)| record.len() != expected)
    {
        Some((index, record)) => Err(AnalysisError::ArityMismatch {
            index,
            expected,
            found: record.len(),
        }),
        None => Ok(()),
    }
}

fn validate(records: &[TimedRecord], keys: &[&str]) -> Result<()> {
    if records.is_empty() {
        return Err(AnalysisError::Values);
    }
    if keys.is_empty() {
        return Err(AnalysisError::Keys("no keys declared".to_string()));
    }

    let mut seen = HashSet::new();
    for key in keys {
        if key.trim().is_empty() {
            return Err(AnalysisError::Keys("empty key name".to_string()));
        }
        if !seen.insert(*key) {
            return Err(AnalysisError::Keys(format!("duplicate key `{key}`")));
        }
    }

    check_arity(records, keys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEYS: [&str; 3] = ["date", "likes", "comments"];

    fn row(date: &str, likes: i64, comments: i64) -> TimedRecord {
        vec![date.to_string(), likes.to_string(), comments.to_string()]
    }

    fn numbers(series: &KeyedSeries, key: &str) -> Vec<i64> {
        series
            .get(key)
            .unwrap()
            .iter()
            .map(|cell| match cell {
                Cell::Number(value) => *value,
                Cell::Text(text) => panic!("expected a weekly average, got {text:?}"),
            })
            .collect()
    }

    #[test]
    fn one_week_is_a_plain_transpose() {
        let records = vec![row("2024-03-01", 10, 2), row("2024-03-02", 14, 5)];
        let series = bucket_one_week(&records, &KEYS).unwrap();

        assert_eq!(series.keys().collect::<Vec<_>>(), KEYS.to_vec());
        assert_eq!(
            series.get("date").unwrap(),
            &[Cell::from("2024-03-01"), Cell::from("2024-03-02")]
        );
        assert_eq!(
            series.get("comments").unwrap(),
            &[Cell::from("2"), Cell::from("5")]
        );
    }

    #[test]
    fn twelve_records_make_two_weeks() {
        let records: Vec<TimedRecord> = (1..=12)
            .map(|day| row(&format!("2024-03-{day:02}"), day * 10, day))
            .collect();
        let series = bucket_many_weeks(&records, &KEYS).unwrap();

        assert_eq!(
            series.get("date").unwrap(),
            &[Cell::from("Week 1"), Cell::from("Week 2")]
        );
        // (10+..+70)/7 = 40, (80+..+120)/5 = 100
        assert_eq!(numbers(&series, "likes"), vec![40, 100]);
        // 28/7 = 4, 50/5 = 10
        assert_eq!(numbers(&series, "comments"), vec![4, 10]);
    }

    #[test]
    fn chunks_keep_input_order() {
        let likes = [5, 1, 9, 3, 7, 2, 8, 100, 0];
        let records: Vec<TimedRecord> = likes
            .iter()
            .enumerate()
            .map(|(day, value)| row(&format!("d{day}"), *value, 0))
            .collect();
        let series = bucket_many_weeks(&records, &KEYS).unwrap();

        // 35/7 = 5, 100/2 = 50
        assert_eq!(numbers(&series, "likes"), vec![5, 50]);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(rounded_mean(&[1, 2]), 2);
        assert_eq!(rounded_mean(&[2, 3]), 2);
        assert_eq!(rounded_mean(&[3, 4]), 4);
        assert_eq!(rounded_mean(&[-2, -3]), -2);
        assert_eq!(rounded_mean(&[1, 1, 2]), 1);
        assert_eq!(rounded_mean(&[1, 2, 2]), 2);
    }

    #[test]
    fn threshold_selects_the_view() {
        let seven: Vec<TimedRecord> = (0..7).map(|day| row(&format!("d{day}"), 1, 1)).collect();
        assert_eq!(
            bucket(&seven, &KEYS).unwrap(),
            bucket_one_week(&seven, &KEYS).unwrap()
        );

        let eight: Vec<TimedRecord> = (0..8).map(|day| row(&format!("d{day}"), 1, 1)).collect();
        assert_eq!(bucket(&eight, &KEYS).unwrap().len(), 2);
    }

    #[test]
    fn rejects_empty_records() {
        assert!(matches!(
            bucket_one_week(&[], &KEYS),
            Err(AnalysisError::Values)
        ));
    }

    #[test]
    fn rejects_bad_keys() {
        let records = vec![row("d", 1, 1)];
        assert!(matches!(
            bucket_one_week(&records, &[]),
            Err(AnalysisError::Keys(_))
        ));
        assert!(matches!(
            bucket_one_week(&records, &["date", "likes", "likes"]),
            Err(AnalysisError::Keys(_))
        ));
        assert!(matches!(
            bucket_one_week(&records, &["date", "", "comments"]),
            Err(AnalysisError::Keys(_))
        ));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let records = vec![row("d1", 1, 1), vec!["d2".to_string(), "4".to_string()]];
        let err = bucket_many_weeks(&records, &KEYS).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ArityMismatch {
                index: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn weekly_values_must_be_integers() {
        let mut records: Vec<TimedRecord> = (0..8).map(|day| row(&format!("d{day}"), 1, 1)).collect();
        records[3][1] = "lots".to_string();
        assert!(matches!(
            bucket_many_weeks(&records, &KEYS),
            Err(AnalysisError::NotAnInteger { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_one_week_transposes(
            rows in prop::collection::vec((any::<u16>(), any::<u32>(), any::<u32>()), 1..20)
        ) {
            let records: Vec<TimedRecord> = rows
                .iter()
                .map(|(date, likes, comments)| row(&date.to_string(), *likes as i64, *comments as i64))
                .collect();
            let series = bucket_one_week(&records, &KEYS).unwrap();

            for (i, key) in KEYS.iter().enumerate() {
                let column = series.get(key).unwrap();
                prop_assert_eq!(column.len(), records.len());
                for (j, record) in records.iter().enumerate() {
                    prop_assert_eq!(column[j].to_string(), record[i].clone());
                }
            }
        }

        #[test]
        fn prop_many_weeks_chunk_count(n in 8usize..60) {
            let records: Vec<TimedRecord> = (0..n).map(|day| row(&format!("d{day}"), 3, 4)).collect();
            let series = bucket_many_weeks(&records, &KEYS).unwrap();
            let weeks = n.div_ceil(DAYS_PER_WEEK);

            prop_assert_eq!(series.get("date").unwrap().len(), weeks);
            prop_assert_eq!(numbers(&series, "likes"), vec![3; weeks]);
            prop_assert_eq!(numbers(&series, "comments"), vec![4; weeks]);
        }
    }
}
