// Compact text summary of the current view for the chat assistant: row
// count, column list, role breakdown, year span and a few sample names.
// Row contents are never included.

use crate::export::EXPORT_COLUMNS;
use crate::leaderboard::{value_counts, GroupKey};
use crate::record::PlayerSeason;

/// Summary facts about a view, independent of any question.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub rows: usize,
    pub role_breakdown: Vec<(String, usize)>,
    pub years: Option<(i32, i32)>,
    pub sample_names: Vec<String>,
}

impl ViewSummary {
    pub fn of(rows: &[&PlayerSeason], sample_rows: usize) -> Self {
        let years = rows.iter().fold(None, |acc: Option<(i32, i32)>, r| {
            Some(match acc {
                Some((lo, hi)) => (lo.min(r.year), hi.max(r.year)),
                None => (r.year, r.year),
            })
        });
        ViewSummary {
            rows: rows.len(),
            role_breakdown: value_counts(rows, GroupKey::Role),
            years,
            sample_names: rows.iter().take(sample_rows).map(|r| r.full_name()).collect(),
        }
    }
}

/// Build the user message sent to the assistant for `question`.
pub fn build_question_prompt(summary: &ViewSummary, question: &str) -> String {
    let breakdown = summary
        .role_breakdown
        .iter()
        .map(|(role, n)| format!("{role}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let years = match summary.years {
        Some((lo, hi)) => format!("{lo} - {hi}"),
        None => "n/a".to_string(),
    };
    let samples = if summary.sample_names.is_empty() {
        "none".to_string()
    } else {
        summary.sample_names.join(", ")
    };

    let mut prompt = String::with_capacity(512);
    prompt.push_str(&format!("Current filtered data: {} players.\n", summary.rows));
    prompt.push_str(&format!("Available columns: {}\n", EXPORT_COLUMNS.join(", ")));
    prompt.push_str(&format!("Role breakdown: {breakdown}\n"));
    prompt.push_str(&format!("Year range: {years}\n"));
    prompt.push_str(&format!("Sample player names: {samples}\n"));
    prompt.push_str(&format!("Question: {}\n", question.trim()));
    prompt.push_str("Please answer concisely using the data above. Use tables if helpful.");
    prompt
}
