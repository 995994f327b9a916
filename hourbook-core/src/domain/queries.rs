//! Read-only views derived from [`AppState`].

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use strum::IntoEnumIterator;
use time::Date;

use super::models::{AppState, Category, Entry, Project, ProjectId};

/// Orderings offered by the entry list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest date first.
    #[default]
    Date,
    /// Longest entry first.
    Hours,
}

/// An entry joined with the project it references, if that project exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryWithProject<'a> {
    pub entry: &'a Entry,
    pub project: Option<&'a Project>,
}

impl<'a> EntryWithProject<'a> {
    /// Project name, or `not_assigned` when there is none.
    pub fn project_name<'b>(&self, not_assigned: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.project.map(|p| p.name.as_str()).unwrap_or(not_assigned)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHours {
    /// `None` groups entries without a (live) project.
    pub project_id: Option<ProjectId>,
    pub name: Option<String>,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoursSummary {
    pub entry_count: usize,
    pub total: f64,
    /// Every category, in declaration order.
    pub by_category: Vec<(Category, f64)>,
    /// Sorted by hours, descending.
    pub by_project: Vec<ProjectHours>,
}

/// True when any field of `entry`, in its string form, contains `query`
/// case-insensitively. Absent optional fields have no string form.
pub fn matches_query(entry: &Entry, query: &str) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }

    // Going through the serialized form keeps new fields searchable.
    match serde_json::to_value(entry) {
        Ok(Value::Object(fields)) => fields
            .values()
            .filter_map(field_text)
            .any(|text| text.to_lowercase().contains(&needle)),
        _ => false,
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl AppState {
    /// Entries matching `query`, in stored order.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| matches_query(e, query))
            .collect()
    }

    /// All entries in `order`; ties keep stored order.
    pub fn sorted(&self, order: SortOrder) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        sort_entries(&mut entries, order);
        entries
    }

    /// Entries matching `query`, sorted by `order`.
    pub fn list(&self, query: &str, order: SortOrder) -> Vec<&Entry> {
        let mut entries = self.search(query);
        sort_entries(&mut entries, order);
        entries
    }

    /// Sum of hours over the explicit selection. Zero when nothing is selected.
    pub fn selected_total(&self) -> f64 {
        self.entries
            .iter()
            .filter(|e| self.selection.contains(&e.id))
            .map(|e| e.hours)
            .sum()
    }

    /// Entries that bulk operations act on: the selection, or every entry
    /// when the selection is empty.
    pub fn report_entries(&self) -> Vec<&Entry> {
        if self.selection.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| self.selection.contains(&e.id))
            .collect()
    }

    /// [`AppState::report_entries`] joined with their projects.
    pub fn report_rows(&self) -> Vec<EntryWithProject<'_>> {
        self.report_entries()
            .into_iter()
            .map(|entry| self.with_project(entry))
            .collect()
    }

    pub fn with_project<'a>(&'a self, entry: &'a Entry) -> EntryWithProject<'a> {
        EntryWithProject {
            entry,
            project: entry.project_id.and_then(|id| self.project(id)),
        }
    }

    pub fn entries_for_project(&self, id: ProjectId) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.project_id == Some(id))
            .collect()
    }

    /// Dates that carry at least one entry.
    pub fn dates_with_entries(&self) -> BTreeSet<Date> {
        self.entries.iter().map(|e| e.date).collect()
    }

    /// Totals over every entry, per category and per project.
    pub fn summary(&self) -> HoursSummary {
        let total = self.entries.iter().map(|e| e.hours).sum();

        let by_category = Category::iter()
            .map(|category| {
                let hours = self
                    .entries
                    .iter()
                    .filter(|e| e.category == category)
                    .map(|e| e.hours)
                    .sum();
                (category, hours)
            })
            .collect();

        let mut per_project: HashMap<Option<ProjectId>, f64> = HashMap::new();
        for entry in &self.entries {
            let key = entry
                .project_id
                .filter(|id| self.project(*id).is_some());
            *per_project.entry(key).or_insert(0.0) += entry.hours;
        }

        let mut by_project: Vec<ProjectHours> = per_project
            .into_iter()
            .map(|(project_id, hours)| ProjectHours {
                project_id,
                name: project_id
                    .and_then(|id| self.project(id))
                    .map(|p| p.name.clone()),
                hours,
            })
            .collect();
        by_project.sort_by(|a, b| {
            b.hours
                .total_cmp(&a.hours)
                .then_with(|| a.project_id.cmp(&b.project_id))
        });

        HoursSummary {
            entry_count: self.entries.len(),
            total,
            by_category,
            by_project,
        }
    }
}

fn sort_entries(entries: &mut [&Entry], order: SortOrder) {
    match order {
        SortOrder::Date => entries.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Hours => entries.sort_by(|a, b| b.hours.total_cmp(&a.hours)),
    }
}
