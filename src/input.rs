use std::path::Path;

use anyhow::Context;

use crate::models::{Comment, TimedRecord};

/// Read the named columns of a CSV file, in the order given. Rows missing a
/// field come back short so the analyzers reject them.
pub fn read_columns(path: &Path, columns: &[&str]) -> anyhow::Result<Vec<TimedRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let positions = columns
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header == *column)
                .with_context(|| format!("{} has no `{column}` column", path.display()))
        })
        .collect::<anyhow::Result<Vec<usize>>>()?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            positions
                .iter()
                .filter_map(|position| row.get(*position))
                .map(str::to_string)
                .collect(),
        );
    }
    Ok(records)
}

pub fn read_comments(path: &Path) -> anyhow::Result<Vec<Comment>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut comments = Vec::new();
    for row in reader.deserialize::<Comment>() {
        comments.push(row.with_context(|| format!("malformed comment in {}", path.display()))?);
    }
    Ok(comments)
}
