use std::fmt::Write;

use crate::models::{KeyedSeries, PostPopularity};

/// Inputs for the Markdown summary; each section is optional.
#[derive(Debug, Default)]
pub struct ReportInputs<'a> {
    pub profile: Option<&'a KeyedSeries>,
    pub posts: Option<&'a KeyedSeries>,
    pub top_posts: &'a [PostPopularity],
    pub behavior: Option<&'a KeyedSeries>,
}

pub fn build_report(username: &str, window: &str, inputs: &ReportInputs<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Account Insights Report");
    let _ = writeln!(output, "Generated for @{} ({})", username, window);

    write_series(&mut output, "Profile Evolution", inputs.profile);
    write_series(&mut output, "Post Interactions", inputs.posts);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Popular Posts");
    if inputs.top_posts.is_empty() {
        let _ = writeln!(output, "No posts recorded for this window.");
    } else {
        for post in inputs.top_posts {
            let _ = writeln!(
                output,
                "- {}: {:.1} likes, {:.1} comments on average",
                post.post_id, post.mean_likes, post.mean_comments
            );
        }
    }

    write_series(&mut output, "Friends and Haters", inputs.behavior);
    output
}

fn write_series(output: &mut String, title: &str, series: Option<&KeyedSeries>) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    let Some(series) = series.filter(|series| !series.is_empty()) else {
        let _ = writeln!(output, "No data recorded for this window.");
        return;
    };

    let keys: Vec<&str> = series.keys().collect();
    let _ = writeln!(output, "| {} |", keys.join(" | "));
    let _ = writeln!(output, "|{}", "---|".repeat(keys.len()));

    for row in 0..series.len() {
        let cells: Vec<String> = series
            .columns()
            .iter()
            .map(|(_, values)| {
                values
                    .get(row)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimedRecord;
    use crate::profile::user_activity;

    #[test]
    fn renders_series_as_tables() {
        let records: Vec<TimedRecord> = vec![
            vec!["2024-05-01".to_string(), "3".to_string()],
            vec!["2024-05-02".to_string(), "5".to_string()],
        ];
        let activity = user_activity("studied", &records).unwrap();
        let report = build_report(
            "studied",
            "all recorded dates",
            &ReportInputs {
                profile: Some(&activity),
                ..Default::default()
            },
        );

        assert!(report.contains("Generated for @studied (all recorded dates)"));
        assert!(report.contains("| date | n_posts |"));
        assert!(report.contains("|---|---|"));
        assert!(report.contains("| 2024-05-02 | 5 |"));
    }

    #[test]
    fn empty_sections_say_so() {
        let report = build_report("studied", "since 2024-05-01", &ReportInputs::default());
        assert!(report.contains("No posts recorded for this window."));
        assert_eq!(report.matches("No data recorded for this window.").count(), 3);
    }

    #[test]
    fn lists_top_posts() {
        let posts = vec![PostPopularity {
            post_id: "p9".to_string(),
            mean_likes: 120.0,
            mean_comments: 8.5,
        }];
        let report = build_report(
            "studied",
            "all recorded dates",
            &ReportInputs {
                top_posts: &posts,
                ..Default::default()
            },
        );
        assert!(report.contains("- p9: 120.0 likes, 8.5 comments on average"));
    }
}
