// Plain-text rendering of views, leaderboards and legends for the terminal.

use rosterscope_app::Conversation;
use rosterscope_baseball::leaderboard::LegendEntry;
use rosterscope_baseball::record::PlayerSeason;
use rosterscope_baseball::stats::StatId;

fn format_value(v: Option<f64>) -> String {
    match v {
        None => "-".to_string(),
        Some(x) if x.fract() == 0.0 => format!("{x:.0}"),
        Some(x) => format!("{x:.3}"),
    }
}

fn row_line(row: &PlayerSeason) -> String {
    format!(
        "{:<24} {:<8} {:<18} {:<5} {:<3} {:<13} {}",
        row.full_name(),
        row.role.as_str(),
        row.team,
        row.year,
        row.state,
        row.region.label(),
        if row.is_drafted() {
            format!("drafted rd {}", row.draft_round)
        } else {
            String::new()
        }
    )
    .trim_end()
    .to_string()
}

/// Row count followed by one line per row, at most `limit` rows.
pub fn render_rows(rows: &[&PlayerSeason], limit: Option<usize>) -> String {
    let mut out = format!("{} players\n", rows.len());
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    for row in &rows[..shown] {
        out.push_str(&row_line(row));
        out.push('\n');
    }
    if shown < rows.len() {
        out.push_str(&format!("... {} more\n", rows.len() - shown));
    }
    out
}

pub fn render_leaders(rows: &[&PlayerSeason], stat: StatId) -> String {
    let mut out = format!("Top {} by {}\n", rows.len(), stat.column());
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<24} {:<18} {:<5} {:>8}\n",
            i + 1,
            row.full_name(),
            row.team,
            row.year,
            format_value(stat.value(row))
        ));
    }
    out
}

pub fn render_legend(entries: &[LegendEntry]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    for e in entries {
        if current != Some(e.outer.as_str()) {
            out.push_str(&format!("{}\n", e.outer));
            current = Some(e.outer.as_str());
        }
        out.push_str(&format!("  {:<24} {:>5}\n", e.inner, e.count));
    }
    out
}

pub fn render_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(value, n)| format!("{value:<24} {n:>5}\n"))
        .collect()
}

/// Recent exchanges, oldest first.
pub fn render_history(conversation: &Conversation) -> String {
    if conversation.is_empty() {
        return "no questions yet\n".to_string();
    }
    let mut out = String::new();
    for e in conversation.iter() {
        out.push_str(&format!("[{}] Q: {}\n", e.asked_at.format("%H:%M:%S"), e.question));
        if e.failed {
            out.push_str(&format!("    Error: {}\n", e.answer));
        } else {
            out.push_str(&format!("    A: {}\n", e.answer));
        }
    }
    out
}
