use time::Date;

use super::ExportError;
use crate::domain::hours::format_hours;
use crate::domain::models::{format_date, AppState, Configuration};

pub const CSV_HEADER: &str = "Date,Start,End,Hours,Description,Project,Location,User";

/// Render the report set of `state` as CSV, one row per entry.
///
/// Entries without a live project get `not_assigned` in the project column.
pub fn export_csv(state: &AppState, not_assigned: &str) -> Result<String, ExportError> {
    let rows = state.report_rows();
    if rows.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in &rows {
        let entry = row.entry;
        let fields = [
            format_date(entry.date),
            escape(&entry.start),
            escape(&entry.end),
            format_hours(entry.hours),
            quote(&entry.description),
            quote(row.project_name(not_assigned)),
            quote(&entry.location),
            quote(&entry.user),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    tracing::debug!(rows = rows.len(), "exported entries as csv");
    Ok(out)
}

/// `Hourbook - <last name>_<yyyy-MM-dd>.csv`, with `User` standing in for a
/// blank last name.
pub fn export_file_name(configuration: &Configuration, today: Date) -> String {
    let last = configuration.last_name.trim();
    let last = if last.is_empty() { "User" } else { last };
    format!("Hourbook - {}_{}.csv", last, format_date(today))
}

/// Text fields are always quoted so embedded commas and line breaks survive.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Time columns stay bare unless they would break the row.
fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        quote(value)
    } else {
        value.to_string()
    }
}
