use csv::{ReaderBuilder, StringRecord, Trim};

use super::ImportError;
use crate::domain::hours::parse_time_of_day;
use crate::domain::models::{parse_date, Category, Configuration, NewEntry, DEFAULT_BREAK_MINUTES};

/// Entries read from a CSV file, ready for [`WorkLog::add_entries`](crate::WorkLog::add_entries).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub entries: Vec<NewEntry>,
    /// Data rows that could not be turned into an entry.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    hours: usize,
    start: Option<usize>,
    end: Option<usize>,
    description: Option<usize>,
    location: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ImportError> {
        Ok(Self {
            date: find_column(headers, "Date").ok_or(ImportError::MissingColumn("Date"))?,
            hours: find_column(headers, "Hours").ok_or(ImportError::MissingColumn("Hours"))?,
            start: find_column(headers, "Start"),
            end: find_column(headers, "End"),
            description: find_column(headers, "Description"),
            location: find_column(headers, "Location"),
        })
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Parse CSV text with a header row into new entries.
///
/// Rows are skipped when their field count differs from the header, when
/// `Date` or `Hours` is blank, or when the date is not `yyyy-MM-dd`.
/// Non-numeric hours import as zero. A start or end that is blank or not an
/// `HH:mm` time falls back to the configured default, and every entry is
/// stamped with the configured user.
pub fn parse_import(text: &str, configuration: &Configuration) -> Result<ImportOutcome, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty);
    }
    let columns = Columns::from_headers(&headers)?;
    let user = configuration.display_name();

    let mut outcome = ImportOutcome::default();
    let mut rows = 0usize;
    for (idx, record) in reader.records().enumerate() {
        rows += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(row = idx + 2, error = %e, "skipping unreadable csv row");
                outcome.skipped += 1;
                continue;
            }
        };
        if record.len() != headers.len() {
            outcome.skipped += 1;
            continue;
        }
        match parse_row(&record, &columns, configuration, &user) {
            Some(entry) => outcome.entries.push(entry),
            None => outcome.skipped += 1,
        }
    }

    if rows == 0 {
        return Err(ImportError::Empty);
    }
    tracing::info!(
        imported = outcome.entries.len(),
        skipped = outcome.skipped,
        "parsed csv import"
    );
    Ok(outcome)
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    configuration: &Configuration,
    user: &str,
) -> Option<NewEntry> {
    let field = |idx: Option<usize>| field_at(record, idx);
    let date_text = field(Some(columns.date));
    let hours_text = field(Some(columns.hours));
    if date_text.is_empty() || hours_text.is_empty() {
        return None;
    }
    let date = parse_date(date_text)?;
    let hours = hours_text
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite())
        .unwrap_or(0.0);

    Some(NewEntry {
        date,
        start: time_or_default(field(columns.start), configuration.start_or_default()),
        end: time_or_default(field(columns.end), configuration.end_or_default()),
        break_minutes: DEFAULT_BREAK_MINUTES,
        hours,
        category: Category::Work,
        description: field(columns.description).to_string(),
        project_id: None,
        location: field(columns.location).to_string(),
        notes: String::new(),
        user: user.to_string(),
    })
}

fn field_at(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn time_or_default(value: &str, default: &str) -> String {
    if parse_time_of_day(value).is_some() {
        value.to_string()
    } else {
        default.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn conf() -> Configuration {
        Configuration {
            first_name: "Jan".to_string(),
            last_name: "Nowak".to_string(),
            default_start: "07:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn imports_exported_rows() {
        let text = "Date,Start,End,Hours,Description,Project,Location,User\n\
                    2024-01-10,08:00,16:00,7.50,\"Formwork, north side\",\"Depot\",\"Utrecht\",\"Someone\"\n";

        let outcome = parse_import(text, &conf()).unwrap();

        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(entry.date, date!(2024 - 01 - 10));
        assert_eq!(entry.hours, 7.5);
        assert_eq!(entry.description, "Formwork, north side");
        assert_eq!(entry.location, "Utrecht");
        assert_eq!(entry.start, "08:00");
        assert_eq!(entry.break_minutes, 30);
        assert_eq!(entry.category, Category::Work);
        assert_eq!(entry.project_id, None);
        assert_eq!(entry.user, "Jan Nowak");
    }

    #[test]
    fn missing_times_use_configured_defaults() {
        let text = "Date,Hours\n2024-01-10,4\n";
        let entry = &parse_import(text, &conf()).unwrap().entries[0];
        assert_eq!(entry.start, "07:00");
        assert_eq!(entry.end, "16:00");
        assert_eq!(entry.description, "");
    }

    #[test]
    fn malformed_times_use_configured_defaults() {
        let text = "Date,Start,End,Hours\n2024-01-10,\"8,00\",noon,8\n";
        let outcome = parse_import(text, &conf()).unwrap();
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.entries[0].start, "07:00");
        assert_eq!(outcome.entries[0].end, "16:00");
    }

    #[test]
    fn import_export_import_keeps_every_row() {
        use crate::domain::models::{AppState, EntryId};
        use crate::exchange::export_csv;

        let text = "Date,Start,End,Hours,Description\n\
                    2024-01-10,\"8,00\",16:00,8,\"Formwork, \"\"north\"\"\"\n\
                    2024-01-11,06:30,15:00,8,Roofing\n";
        let first = parse_import(text, &conf()).unwrap();
        assert_eq!(first.skipped, 0);

        let state = AppState {
            entries: first
                .entries
                .iter()
                .cloned()
                .zip(1..)
                .map(|(entry, id)| entry.with_id(EntryId::new(id)))
                .collect(),
            ..Default::default()
        };
        let exported = export_csv(&state, "-").unwrap();
        let second = parse_import(&exported, &conf()).unwrap();

        assert_eq!(second.skipped, 0);
        assert_eq!(second.entries, first.entries);
    }

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let text = "Date,Hours,Description\n\
                    2024-01-10,8,ok\n\
                    2024-01-11,8\n\
                    ,8,no date\n\
                    2024-01-12,,no hours\n\
                    12.01.2024,8,bad date\n\
                    2024-01-13,lots,still imported\n";

        let outcome = parse_import(text, &conf()).unwrap();

        assert_eq!(outcome.skipped, 4);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[1].hours, 0.0);
    }

    #[test]
    fn header_must_name_date_and_hours() {
        let err = parse_import("Day,Hours\n2024-01-10,8\n", &conf()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("Date")));
        let err = parse_import("Date,Time\n2024-01-10,8\n", &conf()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("Hours")));
    }

    #[test]
    fn header_only_or_blank_file_is_empty() {
        assert!(matches!(
            parse_import("Date,Hours\n", &conf()),
            Err(ImportError::Empty)
        ));
        assert!(matches!(parse_import("", &conf()), Err(ImportError::Empty)));
    }
}
