//! Core of the hourbook work-hours log.
//!
//! Entries and projects live in memory inside a [`WorkLog`]; every mutation is
//! flushed through a [`PersistenceStore`] onto a flat key-value backing store.

pub mod adapters;
pub mod domain;
pub mod exchange;
pub mod persistence;
mod worklog;

pub use domain::models::{
    AppState, Category, Configuration, ConfigurationPatch, Entry, EntryDraft, EntryId, Language,
    NewEntry, NewProject, Project, ProjectId, ProjectPatch, Theme,
};
pub use domain::ports::outbound::{KeyValueStore, StoreError};
pub use domain::queries::SortOrder;
pub use domain::{ValidationError, WorkLogError};
pub use persistence::{LoadReport, PersistError, PersistenceStore, Slice};
pub use worklog::WorkLog;
