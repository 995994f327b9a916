use serde::{Deserialize, Serialize};
use time::Date;

use super::{Category, Configuration, EntryId, ProjectId};
use crate::domain::hours::{coerce_break_minutes, compute_hours};
use crate::domain::ValidationError;

/// Break prefilled on a fresh entry form, in minutes.
pub const DEFAULT_BREAK_MINUTES: u32 = 30;

/// One logged work session on a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub break_minutes: u32,
    /// Net hours computed when the entry was saved.
    pub hours: f64,
    #[serde(default)]
    pub category: Category,
    pub description: String,
    /// Weak reference; may point at a project that no longer exists.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    /// Display name of the user at save time.
    #[serde(default)]
    pub user: String,
}

/// An entry that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: Date,
    pub start: String,
    pub end: String,
    pub break_minutes: u32,
    pub hours: f64,
    pub category: Category,
    pub description: String,
    pub project_id: Option<ProjectId>,
    pub location: String,
    pub notes: String,
    pub user: String,
}

impl NewEntry {
    pub fn with_id(self, id: EntryId) -> Entry {
        Entry {
            id,
            date: self.date,
            start: self.start,
            end: self.end,
            break_minutes: self.break_minutes,
            hours: self.hours,
            category: self.category,
            description: self.description,
            project_id: self.project_id,
            location: self.location,
            notes: self.notes,
            user: self.user,
        }
    }
}

/// The entry form as submitted by the user.
///
/// `editing` is set when the draft overwrites an existing entry; otherwise one
/// entry is created per date in `dates`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub editing: Option<EntryId>,
    pub dates: Vec<Date>,
    pub description: String,
    pub start: String,
    pub end: String,
    /// Raw break text; coerced with [`coerce_break_minutes`].
    pub break_input: String,
    pub category: Category,
    pub project_id: Option<ProjectId>,
    pub location: String,
    pub notes: String,
}

impl EntryDraft {
    /// Blank form prefilled with the configured default times.
    pub fn for_new(configuration: &Configuration) -> Self {
        Self {
            editing: None,
            dates: Vec::new(),
            description: String::new(),
            start: configuration.start_or_default().to_string(),
            end: configuration.end_or_default().to_string(),
            break_input: DEFAULT_BREAK_MINUTES.to_string(),
            category: Category::Work,
            project_id: None,
            location: String::new(),
            notes: String::new(),
        }
    }

    /// Form loaded with an existing entry, ready to be edited.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            editing: Some(entry.id),
            dates: vec![entry.date],
            description: entry.description.clone(),
            start: entry.start.clone(),
            end: entry.end.clone(),
            break_input: entry.break_minutes.to_string(),
            category: entry.category,
            project_id: entry.project_id,
            location: entry.location.clone(),
            notes: entry.notes.clone(),
        }
    }

    pub fn with_dates(mut self, dates: impl IntoIterator<Item = Date>) -> Self {
        self.dates = dates.into_iter().collect();
        self
    }

    pub fn break_minutes(&self) -> u32 {
        coerce_break_minutes(&self.break_input)
    }

    /// Live hours preview for the form.
    pub fn hours(&self) -> f64 {
        compute_hours(&self.start, &self.end, self.break_minutes())
    }

    /// Check the save invariant and return the computed hours.
    pub fn validate(&self) -> Result<f64, ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if self.start.trim().is_empty() || self.end.trim().is_empty() {
            return Err(ValidationError::MissingTime);
        }
        if self.dates.is_empty() {
            return Err(ValidationError::NoDates);
        }
        let hours = self.hours();
        if hours <= 0.0 {
            return Err(ValidationError::NonPositiveHours);
        }
        Ok(hours)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Entry contents for `date`, stamped with `user`.
    pub(crate) fn to_new_entry(&self, date: Date, hours: f64, user: &str) -> NewEntry {
        NewEntry {
            date,
            start: self.start.clone(),
            end: self.end.clone(),
            break_minutes: self.break_minutes(),
            hours,
            category: self.category,
            description: self.description.trim().to_string(),
            project_id: self.project_id,
            location: self.location.trim().to_string(),
            notes: self.notes.trim().to_string(),
            user: user.to_string(),
        }
    }
}

/// Parse an ISO `yyyy-MM-dd` calendar date.
pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), iso_date::FORMAT).ok()
}

/// Render a date as ISO `yyyy-MM-dd`.
pub fn format_date(date: Date) -> String {
    date.format(iso_date::FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub(crate) mod iso_date {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

    pub(crate) const FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(FORMAT).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        Date::parse(&text, FORMAT).map_err(D::Error::custom)
    }
}
