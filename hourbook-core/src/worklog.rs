use std::collections::BTreeSet;
use std::sync::Arc;

use time::Date;

use crate::domain::models::{
    AppState, ConfigurationPatch, Entry, EntryDraft, EntryId, IdCounter, Language, NewEntry,
    NewProject, Project, ProjectId, ProjectPatch, Theme,
};
use crate::domain::ports::outbound::KeyValueStore;
use crate::domain::WorkLogError;
use crate::persistence::{LoadReport, PersistenceStore, Slice};

/// In-memory source of truth for the work log.
///
/// Every action applies its change to memory first and then flushes through
/// the [`PersistenceStore`]. A failed flush is returned as
/// [`WorkLogError::Persist`] but the in-memory change stays; call
/// [`WorkLog::sync`] to retry the write instead of repeating the action.
///
/// Slices that could not be read on open are held back from writes until an
/// action changes them, so the stored value stays available for recovery.
#[derive(Debug)]
pub struct WorkLog<S> {
    state: AppState,
    persistence: PersistenceStore<S>,
    entry_ids: IdCounter,
    project_ids: IdCounter,
    held: BTreeSet<Slice>,
}

impl<S: KeyValueStore> WorkLog<S> {
    /// Load state from `store`, falling back to defaults per slice.
    pub async fn open(store: Arc<S>) -> Self {
        let persistence = PersistenceStore::new(store);
        let report = persistence.load_report().await;
        Self::from_report(persistence, report)
    }

    pub fn from_report(persistence: PersistenceStore<S>, report: LoadReport) -> Self {
        if !report.degraded.is_empty() {
            tracing::warn!(
                slices = ?report.degraded,
                "some slices were reset to defaults; their stored values are kept until changed"
            );
        }
        let mut log = Self {
            state: report.state,
            persistence,
            entry_ids: IdCounter::default(),
            project_ids: IdCounter::default(),
            held: report.degraded.into_iter().collect(),
        };
        log.reseed_ids();
        log
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn entries(&self) -> &[Entry] {
        &self.state.entries
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.state.entry(id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.state.project(id)
    }

    pub fn is_selected(&self, id: EntryId) -> bool {
        self.state.selection.contains(&id)
    }

    /// Slices still held back from writes since they failed to load.
    pub fn held_slices(&self) -> impl Iterator<Item = Slice> + '_ {
        self.held.iter().copied()
    }

    /// Blank entry form prefilled from the current configuration.
    pub fn new_draft(&self) -> EntryDraft {
        EntryDraft::for_new(&self.state.configuration)
    }

    /// Save an entry form.
    ///
    /// A new draft creates one entry per distinct date. An edit overwrites the
    /// target entry with the first date of the draft and keeps its id.
    /// Returns the ids that were written. If only the flush fails, the entries
    /// are already in [`WorkLog::entries`] and [`WorkLog::sync`] retries it.
    pub async fn save_entry(&mut self, draft: &EntryDraft) -> Result<Vec<EntryId>, WorkLogError> {
        let hours = draft.validate()?;
        let user = self.state.configuration.display_name();

        let ids = match draft.editing {
            Some(id) => {
                let date = draft.dates[0];
                let entry = self
                    .state
                    .entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or(WorkLogError::EntryNotFound(id))?;
                *entry = draft.to_new_entry(date, hours, &user).with_id(id);
                vec![id]
            }
            None => {
                let mut dates: Vec<Date> = Vec::with_capacity(draft.dates.len());
                for date in &draft.dates {
                    if !dates.contains(date) {
                        dates.push(*date);
                    }
                }
                dates
                    .into_iter()
                    .map(|date| self.push_entry(draft.to_new_entry(date, hours, &user)))
                    .collect()
            }
        };

        self.flush(&[Slice::Entries]).await?;
        Ok(ids)
    }

    /// Append entries produced outside the entry form, e.g. by an import.
    /// Each receives a fresh id.
    pub async fn add_entries(&mut self, entries: Vec<NewEntry>) -> Result<Vec<EntryId>, WorkLogError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<EntryId> = entries.into_iter().map(|e| self.push_entry(e)).collect();
        tracing::info!(count = ids.len(), "added entries");
        self.flush(&[Slice::Entries]).await?;
        Ok(ids)
    }

    /// Remove an entry and drop it from the selection.
    ///
    /// Deleting an id that does not exist is a no-op and returns `Ok(false)`.
    pub async fn delete_entry(&mut self, id: EntryId) -> Result<bool, WorkLogError> {
        let before = self.state.entries.len();
        self.state.entries.retain(|e| e.id != id);
        if self.state.entries.len() == before {
            return Ok(false);
        }
        self.state.selection.remove(&id);

        self.flush(&[Slice::Entries, Slice::Selection]).await?;
        Ok(true)
    }

    /// Flip selection of an entry. Returns whether it is selected afterwards.
    ///
    /// An id without an entry is a no-op and returns `Ok(false)`.
    pub async fn toggle_selected(&mut self, id: EntryId) -> Result<bool, WorkLogError> {
        if self.state.entry(id).is_none() {
            return Ok(false);
        }
        let selected = if self.state.selection.remove(&id) {
            false
        } else {
            self.state.selection.insert(id);
            true
        };

        self.flush(&[Slice::Selection]).await?;
        Ok(selected)
    }

    pub async fn select_all(&mut self) -> Result<(), WorkLogError> {
        self.state.selection = self.state.entries.iter().map(|e| e.id).collect();
        self.flush(&[Slice::Selection]).await
    }

    pub async fn clear_selection(&mut self) -> Result<(), WorkLogError> {
        self.state.selection.clear();
        self.flush(&[Slice::Selection]).await
    }

    pub async fn add_project(&mut self, project: NewProject) -> Result<ProjectId, WorkLogError> {
        project.validate()?;
        let id = ProjectId::new(self.project_ids.next());
        self.state.projects.push(Project::from_new(id, project));

        self.flush(&[Slice::Projects]).await?;
        Ok(id)
    }

    pub async fn update_project(
        &mut self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<(), WorkLogError> {
        patch.validate()?;
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(WorkLogError::ProjectNotFound(id))?;
        project.apply(patch);

        self.flush(&[Slice::Projects]).await
    }

    /// Remove a project and clear the reference on every entry that used it.
    /// Entries themselves are kept.
    ///
    /// Deleting an id that does not exist is a no-op and returns `Ok(false)`.
    pub async fn delete_project(&mut self, id: ProjectId) -> Result<bool, WorkLogError> {
        let before = self.state.projects.len();
        self.state.projects.retain(|p| p.id != id);
        if self.state.projects.len() == before {
            return Ok(false);
        }
        for entry in self
            .state
            .entries
            .iter_mut()
            .filter(|e| e.project_id == Some(id))
        {
            entry.project_id = None;
        }

        self.flush(&[Slice::Projects, Slice::Entries]).await?;
        Ok(true)
    }

    pub async fn update_configuration(
        &mut self,
        patch: ConfigurationPatch,
    ) -> Result<(), WorkLogError> {
        self.state.configuration.apply(patch);
        self.flush(&[Slice::Configuration]).await
    }

    pub async fn set_language(&mut self, language: Language) -> Result<(), WorkLogError> {
        self.state.language = language;
        self.flush_slice(Slice::Language).await
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), WorkLogError> {
        self.state.theme = theme;
        self.flush_slice(Slice::Theme).await
    }

    /// Switch to the next theme and return it.
    pub async fn toggle_theme(&mut self) -> Result<Theme, WorkLogError> {
        let next = self.state.theme.next();
        self.set_theme(next).await?;
        Ok(next)
    }

    /// Wipe the backing store and return to defaults.
    ///
    /// If the store cannot be cleared, in-memory state is left untouched.
    pub async fn reset_all(&mut self) -> Result<(), WorkLogError> {
        self.persistence.clear().await?;
        self.state = AppState::default();
        self.held.clear();
        self.reseed_ids();
        tracing::info!("reset all data");
        Ok(())
    }

    /// Write every slice that is not held back. Used to retry after a
    /// failed flush.
    pub async fn sync(&mut self) -> Result<(), WorkLogError> {
        self.flush(&[]).await
    }

    fn push_entry(&mut self, entry: NewEntry) -> EntryId {
        let id = EntryId::new(self.entry_ids.next());
        self.state.entries.push(entry.with_id(id));
        id
    }

    /// Ids still referenced anywhere in state count as taken, so a dangling
    /// reference never attaches to a newly created record.
    fn reseed_ids(&mut self) {
        let state = &self.state;
        self.entry_ids = IdCounter::after(
            state
                .entries
                .iter()
                .map(|e| e.id)
                .chain(state.selection.iter().copied())
                .map(|id| id.as_u64()),
        );
        self.project_ids = IdCounter::after(
            state
                .projects
                .iter()
                .map(|p| p.id)
                .chain(state.entries.iter().filter_map(|e| e.project_id))
                .map(|id| id.as_u64()),
        );
    }

    /// Release `changed` from the held set, then write every slice not held.
    async fn flush(&mut self, changed: &[Slice]) -> Result<(), WorkLogError> {
        for slice in changed {
            self.held.remove(slice);
        }
        let held = &self.held;
        let slices = Slice::ALL.into_iter().filter(|s| !held.contains(s));
        self.persistence
            .save_slices(slices, &self.state)
            .await
            .map_err(WorkLogError::from)
    }

    async fn flush_slice(&mut self, slice: Slice) -> Result<(), WorkLogError> {
        self.held.remove(&slice);
        self.persistence
            .save_slice(slice, &self.state)
            .await
            .map_err(WorkLogError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::InMemoryStore;
    use crate::domain::models::{Category, ProjectId};
    use crate::domain::ValidationError;
    use time::macros::date;

    async fn open() -> (Arc<InMemoryStore>, WorkLog<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let log = WorkLog::open(Arc::clone(&store)).await;
        (store, log)
    }

    fn draft(log: &WorkLog<InMemoryStore>, description: &str) -> EntryDraft {
        EntryDraft {
            description: description.to_string(),
            ..log.new_draft()
        }
        .with_dates([date!(2024 - 01 - 10)])
    }

    #[tokio::test]
    async fn multi_date_draft_creates_one_entry_per_date() {
        let (_, mut log) = open().await;
        log.update_configuration(ConfigurationPatch {
            first_name: Some("Jan".to_string()),
            last_name: Some("Nowak".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let draft = EntryDraft {
            description: "Test".to_string(),
            start: "08:00".to_string(),
            end: "16:00".to_string(),
            break_input: "30".to_string(),
            ..log.new_draft()
        }
        .with_dates([date!(2024 - 01 - 10), date!(2024 - 01 - 11)]);

        let ids = log.save_entry(&draft).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        for entry in entries {
            assert_eq!(entry.hours, 7.5);
            assert_eq!(entry.description, "Test");
            assert_eq!(entry.start, "08:00");
            assert_eq!(entry.end, "16:00");
            assert_eq!(entry.break_minutes, 30);
            assert_eq!(entry.category, Category::Work);
            assert_eq!(entry.user, "Jan Nowak");
        }
        assert_eq!(entries[0].date, date!(2024 - 01 - 10));
        assert_eq!(entries[1].date, date!(2024 - 01 - 11));
    }

    #[tokio::test]
    async fn duplicate_dates_create_one_entry() {
        let (_, mut log) = open().await;
        let draft = draft(&log, "Test").with_dates([date!(2024 - 01 - 10), date!(2024 - 01 - 10)]);
        assert_eq!(log.save_entry(&draft).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_changes_nothing() {
        let (store, mut log) = open().await;
        let draft = draft(&log, "");

        let err = log.save_entry(&draft).await.unwrap_err();

        assert!(matches!(
            err,
            WorkLogError::Validation(ValidationError::MissingDescription)
        ));
        assert!(log.entries().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn edit_keeps_id_and_uses_first_date() {
        let (_, mut log) = open().await;
        let id = log.save_entry(&draft(&log, "Formwork")).await.unwrap()[0];

        let mut edit = EntryDraft::from_entry(log.entry(id).unwrap())
            .with_dates([date!(2024 - 02 - 01), date!(2024 - 02 - 02)]);
        edit.end = "12:00".to_string();
        edit.break_input = "0".to_string();

        assert_eq!(log.save_entry(&edit).await.unwrap(), vec![id]);
        assert_eq!(log.entries().len(), 1);
        let entry = log.entry(id).unwrap();
        assert_eq!(entry.date, date!(2024 - 02 - 01));
        assert_eq!(entry.hours, 4.0);
    }

    #[tokio::test]
    async fn editing_missing_entry_is_not_found() {
        let (_, mut log) = open().await;
        let mut edit = draft(&log, "Formwork");
        edit.editing = Some(EntryId::new(77));

        assert!(matches!(
            log.save_entry(&edit).await,
            Err(WorkLogError::EntryNotFound(id)) if id == EntryId::new(77)
        ));
    }

    #[tokio::test]
    async fn deleting_entry_removes_it_from_selection() {
        let (_, mut log) = open().await;
        let id = log.save_entry(&draft(&log, "Formwork")).await.unwrap()[0];
        assert!(log.toggle_selected(id).await.unwrap());

        assert!(log.delete_entry(id).await.unwrap());

        assert!(log.entries().is_empty());
        assert!(!log.is_selected(id));
        assert!(log.state().selection.is_empty());
    }

    #[tokio::test]
    async fn deleting_missing_entry_is_a_noop() {
        let (_, mut log) = open().await;
        log.save_entry(&draft(&log, "Formwork")).await.unwrap();

        assert!(!log.delete_entry(EntryId::new(404)).await.unwrap());
        assert_eq!(log.entries().len(), 1);
    }

    #[tokio::test]
    async fn toggle_selected_flips_membership() {
        let (_, mut log) = open().await;
        let id = log.save_entry(&draft(&log, "Formwork")).await.unwrap()[0];

        assert!(log.toggle_selected(id).await.unwrap());
        assert!(log.is_selected(id));
        assert!(!log.toggle_selected(id).await.unwrap());
        assert!(!log.is_selected(id));
    }

    #[tokio::test]
    async fn toggling_missing_entry_is_a_noop() {
        let (store, mut log) = open().await;

        assert!(!log.toggle_selected(EntryId::new(999)).await.unwrap());
        assert!(log.state().selection.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn select_all_and_clear() {
        let (_, mut log) = open().await;
        let draft = draft(&log, "Formwork").with_dates([date!(2024 - 01 - 10), date!(2024 - 01 - 11)]);
        log.save_entry(&draft).await.unwrap();

        log.select_all().await.unwrap();
        assert_eq!(log.state().selection.len(), 2);
        assert_eq!(log.state().selected_total(), 15.0);

        log.clear_selection().await.unwrap();
        assert_eq!(log.state().selected_total(), 0.0);
    }

    #[tokio::test]
    async fn deleting_project_clears_references_but_keeps_entries() {
        let (_, mut log) = open().await;
        let depot = log.add_project(NewProject::named("Depot")).await.unwrap();
        let hal = log.add_project(NewProject::named("Hal")).await.unwrap();
        assert_ne!(depot, hal);

        let mut on_depot = draft(&log, "Formwork").with_dates([date!(2024 - 01 - 10), date!(2024 - 01 - 11)]);
        on_depot.project_id = Some(depot);
        log.save_entry(&on_depot).await.unwrap();
        let mut on_hal = draft(&log, "Roofing");
        on_hal.project_id = Some(hal);
        log.save_entry(&on_hal).await.unwrap();

        assert!(log.delete_project(depot).await.unwrap());

        assert_eq!(log.entries().len(), 3);
        assert!(log.state().entries_for_project(depot).is_empty());
        assert_eq!(log.state().entries_for_project(hal).len(), 1);
        assert!(log.project(depot).is_none());
        assert!(!log.delete_project(depot).await.unwrap());
    }

    #[tokio::test]
    async fn update_project_merges_fields() {
        let (_, mut log) = open().await;
        let id = log.add_project(NewProject::named("Depot")).await.unwrap();

        log.update_project(
            id,
            ProjectPatch {
                notes: Some("night shifts".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let project = log.project(id).unwrap();
        assert_eq!(project.name, "Depot");
        assert_eq!(project.notes, "night shifts");

        assert!(matches!(
            log.update_project(ProjectId::new(50), ProjectPatch::default()).await,
            Err(WorkLogError::ProjectNotFound(_))
        ));
        assert!(matches!(
            log.add_project(NewProject::named(" ")).await,
            Err(WorkLogError::Validation(ValidationError::MissingProjectName))
        ));
    }

    #[tokio::test]
    async fn flush_failure_keeps_in_memory_change() {
        let (store, mut log) = open().await;
        store.set_offline(true);

        let err = log.save_entry(&draft(&log, "Formwork")).await.unwrap_err();

        assert!(err.is_persist());
        assert_eq!(log.entries().len(), 1);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let (store, mut log) = open().await;
        let project = log.add_project(NewProject::named("Depot")).await.unwrap();
        let mut d = draft(&log, "Formwork");
        d.project_id = Some(project);
        let id = log.save_entry(&d).await.unwrap()[0];
        log.toggle_selected(id).await.unwrap();
        log.set_language(Language::Nl).await.unwrap();
        assert_eq!(log.toggle_theme().await.unwrap(), Theme::Light);

        let reopened = WorkLog::open(Arc::clone(&store)).await;

        assert_eq!(reopened.state(), log.state());
    }

    #[tokio::test]
    async fn ids_continue_after_reopen() {
        let (store, mut log) = open().await;
        let first = log.save_entry(&draft(&log, "Formwork")).await.unwrap()[0];

        let mut reopened = WorkLog::open(Arc::clone(&store)).await;
        let second = reopened.save_entry(&draft(&reopened, "Roofing")).await.unwrap()[0];

        assert!(second > first);
    }

    #[tokio::test]
    async fn new_project_never_reuses_an_id_still_on_entries() {
        let (store, mut log) = open().await;
        let depot = log.add_project(NewProject::named("Depot")).await.unwrap();
        let mut d = draft(&log, "Formwork");
        d.project_id = Some(depot);
        let id = log.save_entry(&d).await.unwrap()[0];
        store
            .set(&Slice::Projects.key(), "{oops")
            .await
            .unwrap();

        let mut reopened = WorkLog::open(Arc::clone(&store)).await;
        let unrelated = reopened
            .add_project(NewProject::named("Unrelated"))
            .await
            .unwrap();

        assert_ne!(unrelated, depot);
        let entry = reopened.entry(id).unwrap();
        assert_eq!(reopened.state().with_project(entry).project_name("-"), "-");
    }

    #[tokio::test]
    async fn corrupt_slice_survives_unrelated_actions() {
        let entries_key = Slice::Entries.key();
        let store = Arc::new(InMemoryStore::with_values([(
            entries_key.as_str(),
            "[{\"id\":1,\"date\":\"2024-01-",
        )]));
        let mut log = WorkLog::open(Arc::clone(&store)).await;
        assert_eq!(log.held_slices().collect::<Vec<_>>(), vec![Slice::Entries]);

        log.add_project(NewProject::named("Depot")).await.unwrap();
        log.set_theme(Theme::Light).await.unwrap();

        assert_eq!(
            store.get(&entries_key).await.unwrap().as_deref(),
            Some("[{\"id\":1,\"date\":\"2024-01-")
        );
        assert!(store.get(&Slice::Projects.key()).await.unwrap().is_some());

        log.save_entry(&draft(&log, "Formwork")).await.unwrap();

        assert_eq!(log.held_slices().count(), 0);
        let reopened = WorkLog::open(Arc::clone(&store)).await;
        assert_eq!(reopened.entries().len(), 1);
    }

    #[tokio::test]
    async fn sync_retries_a_failed_flush_without_duplicates() {
        let (store, mut log) = open().await;
        store.set_offline(true);
        assert!(log.save_entry(&draft(&log, "Formwork")).await.is_err());
        let id = log.entries()[0].id;

        store.set_offline(false);
        log.sync().await.unwrap();

        let reopened = WorkLog::open(Arc::clone(&store)).await;
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(reopened.entries()[0].id, id);
    }

    #[tokio::test]
    async fn reset_clears_store_and_memory() {
        let (store, mut log) = open().await;
        log.save_entry(&draft(&log, "Formwork")).await.unwrap();
        log.set_theme(Theme::Onyx).await.unwrap();

        log.reset_all().await.unwrap();

        assert_eq!(log.state(), &AppState::default());
        assert!(store.is_empty().await);
        let id = log.save_entry(&draft(&log, "Fresh")).await.unwrap()[0];
        assert_eq!(id, EntryId::new(1));
    }

    #[tokio::test]
    async fn failed_reset_leaves_state_untouched() {
        let (store, mut log) = open().await;
        log.save_entry(&draft(&log, "Formwork")).await.unwrap();
        store.set_offline(true);

        assert!(log.reset_all().await.is_err());
        assert_eq!(log.entries().len(), 1);
    }

    #[tokio::test]
    async fn language_change_writes_only_its_slice() {
        let (store, mut log) = open().await;
        log.set_language(Language::En).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get(&Slice::Language.key()).await.unwrap(),
            Some("en".to_string())
        );
    }
}
