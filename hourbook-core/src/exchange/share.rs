use std::fmt::Write as _;

use crate::domain::hours::format_hours;
use crate::domain::models::{format_date, AppState, Category};

/// Every user-visible word in the shared summary, so callers can localize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLabels {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub entries_heading: String,
    /// Plural noun after the entry count.
    pub entries: String,
    pub total: String,
    pub not_assigned: String,
    pub work: String,
    pub overtime: String,
    pub vacation: String,
}

impl Default for ShareLabels {
    fn default() -> Self {
        Self {
            title: "Hourbook".to_string(),
            first_name: "First name".to_string(),
            last_name: "Last name".to_string(),
            entries_heading: "Work log".to_string(),
            entries: "entries".to_string(),
            total: "Total".to_string(),
            not_assigned: "No project".to_string(),
            work: "Work".to_string(),
            overtime: "Overtime".to_string(),
            vacation: "Vacation".to_string(),
        }
    }
}

impl ShareLabels {
    pub fn category(&self, category: Category) -> &str {
        match category {
            Category::Work => &self.work,
            Category::Overtime => &self.overtime,
            Category::Vacation => &self.vacation,
        }
    }
}

/// Plain-text summary of the report set, formatted for a messenger that
/// renders `*bold*` and `_italic_`.
pub fn share_text(state: &AppState, labels: &ShareLabels) -> String {
    let rows = state.report_rows();
    let total: f64 = rows.iter().map(|r| r.entry.hours).sum();
    let conf = &state.configuration;

    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(text, "*{}*", labels.title);
    let _ = writeln!(text);
    let _ = writeln!(text, "*{}:* {}", labels.first_name, or_dash(&conf.first_name));
    let _ = writeln!(text, "*{}:* {}", labels.last_name, or_dash(&conf.last_name));
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "*{} ({} {}):*",
        labels.entries_heading,
        rows.len(),
        labels.entries
    );

    for row in &rows {
        let entry = row.entry;
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "*{}* ({}h, {}):",
            format_date(entry.date),
            format_hours(entry.hours),
            labels.category(entry.category)
        );
        let _ = writeln!(
            text,
            " - {} [{}]",
            entry.description,
            row.project_name(&labels.not_assigned)
        );
        if !entry.notes.is_empty() {
            let _ = writeln!(text, " - _{}_", entry.notes);
        }
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "*{}:* {}h", labels.total, format_hours(total));
    text
}

fn or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
