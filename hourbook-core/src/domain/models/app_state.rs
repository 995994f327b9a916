use std::collections::BTreeSet;

use super::{Configuration, Entry, EntryId, Language, Project, ProjectId, Theme};

/// Everything the application persists, one field per slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub entries: Vec<Entry>,
    pub projects: Vec<Project>,
    pub configuration: Configuration,
    /// Entry ids picked for bulk operations.
    pub selection: BTreeSet<EntryId>,
    pub language: Language,
    pub theme: Theme,
}

impl AppState {
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Drop selected ids that no longer name a live entry.
    ///
    /// Returns how many ids were removed.
    pub fn prune_selection(&mut self) -> usize {
        let before = self.selection.len();
        let live: BTreeSet<EntryId> = self.entries.iter().map(|e| e.id).collect();
        self.selection.retain(|id| live.contains(id));
        before - self.selection.len()
    }
}
