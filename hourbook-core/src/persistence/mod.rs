//! Slice-by-slice persistence of [`AppState`] onto a [`KeyValueStore`].
//!
//! Each slice lives under its own key so that a corrupt value only costs that
//! slice. Entries are stored under a key carrying [`SCHEMA_VERSION`]; older
//! versions are never read back.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::models::{AppState, Configuration, Entry, EntryId, Project};
use crate::domain::ports::outbound::{KeyValueStore, StoreError};

pub const STORAGE_KEY_PREFIX: &str = "hourbook";
pub const SCHEMA_VERSION: u32 = 10;

/// One independently persisted part of [`AppState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slice {
    Entries,
    Projects,
    Configuration,
    Selection,
    Language,
    Theme,
}

impl Slice {
    pub const ALL: [Slice; 6] = [
        Slice::Entries,
        Slice::Projects,
        Slice::Configuration,
        Slice::Selection,
        Slice::Language,
        Slice::Theme,
    ];

    /// Storage key of this slice.
    pub fn key(&self) -> String {
        match self {
            Slice::Entries => entries_key(SCHEMA_VERSION),
            Slice::Projects => format!("{STORAGE_KEY_PREFIX}Projects"),
            Slice::Configuration => format!("{STORAGE_KEY_PREFIX}Conf"),
            Slice::Selection => format!("{STORAGE_KEY_PREFIX}Selected"),
            Slice::Language => format!("{STORAGE_KEY_PREFIX}Lang"),
            Slice::Theme => format!("{STORAGE_KEY_PREFIX}Theme"),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slice::Entries => "entries",
            Slice::Projects => "projects",
            Slice::Configuration => "configuration",
            Slice::Selection => "selection",
            Slice::Language => "language",
            Slice::Theme => "theme",
        };
        f.write_str(name)
    }
}

fn entries_key(version: u32) -> String {
    format!("{STORAGE_KEY_PREFIX}Data_v{version}")
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {slice} slice: {source}")]
    Write {
        slice: Slice,
        #[source]
        source: StoreError,
    },
    #[error("failed to encode {slice} slice: {source}")]
    Encode {
        slice: Slice,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to clear storage: {0}")]
    Clear(#[source] StoreError),
}

impl PersistError {
    /// The slice that failed, if the error concerns a single slice.
    pub fn slice(&self) -> Option<Slice> {
        match self {
            PersistError::Write { slice, .. } | PersistError::Encode { slice, .. } => Some(*slice),
            PersistError::Clear(_) => None,
        }
    }
}

/// Result of a load: the state plus the slices that fell back to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub state: AppState,
    /// Slices whose stored value was unreadable or corrupt.
    pub degraded: Vec<Slice>,
    /// Selected ids dropped because no entry carries them.
    pub pruned_selection: usize,
}

/// Reads and writes [`AppState`] slices through a key-value store.
#[derive(Debug)]
pub struct PersistenceStore<S> {
    store: Arc<S>,
}

impl<S> Clone for PersistenceStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> PersistenceStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Load every slice. Never fails: a missing slice takes its default, and
    /// an unreadable or corrupt slice takes its default and is reported in
    /// [`LoadReport::degraded`].
    pub async fn load_report(&self) -> LoadReport {
        let mut report = LoadReport::default();

        if let Some(entries) = self
            .read_json::<Vec<Entry>>(Slice::Entries, &mut report.degraded)
            .await
        {
            report.state.entries = entries;
        } else if !report.degraded.contains(&Slice::Entries) {
            self.warn_about_legacy_entries().await;
        }

        if let Some(projects) = self
            .read_json::<Vec<Project>>(Slice::Projects, &mut report.degraded)
            .await
        {
            report.state.projects = projects;
        }

        // A stored `null` configuration also means "use defaults".
        if let Some(Some(configuration)) = self
            .read_json::<Option<Configuration>>(Slice::Configuration, &mut report.degraded)
            .await
        {
            report.state.configuration = configuration;
        }

        if let Some(selection) = self
            .read_json::<BTreeSet<EntryId>>(Slice::Selection, &mut report.degraded)
            .await
        {
            report.state.selection = selection;
        }

        if let Some(language) = self.read_scalar(Slice::Language, &mut report.degraded).await {
            report.state.language = language;
        }

        if let Some(theme) = self.read_scalar(Slice::Theme, &mut report.degraded).await {
            report.state.theme = theme;
        }

        report.pruned_selection = report.state.prune_selection();
        if report.pruned_selection > 0 {
            tracing::debug!(
                pruned = report.pruned_selection,
                "dropped selected ids without a matching entry"
            );
        }

        report
    }

    pub async fn load(&self) -> AppState {
        self.load_report().await.state
    }

    /// Write every slice.
    ///
    /// All slices are attempted even after a failure; the first failure is
    /// returned.
    pub async fn save(&self, state: &AppState) -> Result<(), PersistError> {
        self.save_slices(Slice::ALL, state).await
    }

    /// Write the given slices, attempting each one and returning the first
    /// failure.
    pub async fn save_slices(
        &self,
        slices: impl IntoIterator<Item = Slice>,
        state: &AppState,
    ) -> Result<(), PersistError> {
        let mut first_error = None;
        let mut written = 0usize;
        for slice in slices {
            match self.save_slice(slice, state).await {
                Ok(()) => written += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        tracing::debug!(written, entries = state.entries.len(), "flushed state");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Write a single slice.
    pub async fn save_slice(&self, slice: Slice, state: &AppState) -> Result<(), PersistError> {
        let encoded = encode(slice, state)?;
        self.store
            .set(&slice.key(), &encoded)
            .await
            .map_err(|source| {
                tracing::error!(%slice, error = %source, "failed to persist slice");
                PersistError::Write { slice, source }
            })
    }

    /// Remove every stored key.
    pub async fn clear(&self) -> Result<(), PersistError> {
        self.store.clear().await.map_err(|e| {
            tracing::error!(error = %e, "failed to clear storage");
            PersistError::Clear(e)
        })
    }

    async fn read_raw(&self, slice: Slice, degraded: &mut Vec<Slice>) -> Option<String> {
        match self.store.get(&slice.key()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%slice, error = %e, "could not read slice, using defaults");
                degraded.push(slice);
                None
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        slice: Slice,
        degraded: &mut Vec<Slice>,
    ) -> Option<T> {
        let raw = self.read_raw(slice, degraded).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%slice, error = %e, "corrupt slice, using defaults");
                degraded.push(slice);
                None
            }
        }
    }

    async fn read_scalar<T: FromStr>(&self, slice: Slice, degraded: &mut Vec<Slice>) -> Option<T> {
        let raw = self.read_raw(slice, degraded).await?;
        if raw.trim().is_empty() {
            return None;
        }
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%slice, value = %raw, "unknown value, using default");
                degraded.push(slice);
                None
            }
        }
    }

    /// Entries written under an older schema version are left untouched.
    async fn warn_about_legacy_entries(&self) {
        for version in (1..SCHEMA_VERSION).rev() {
            let key = entries_key(version);
            if let Ok(Some(_)) = self.store.get(&key).await {
                tracing::warn!(
                    %key,
                    current = SCHEMA_VERSION,
                    "found entries from an older schema version; they are not migrated"
                );
                return;
            }
        }
    }
}

fn encode(slice: Slice, state: &AppState) -> Result<String, PersistError> {
    let encoded = match slice {
        Slice::Entries => serde_json::to_string(&state.entries),
        Slice::Projects => serde_json::to_string(&state.projects),
        Slice::Configuration => serde_json::to_string(&state.configuration),
        Slice::Selection => serde_json::to_string(&state.selection),
        Slice::Language => return Ok(state.language.to_string()),
        Slice::Theme => return Ok(state.theme.to_string()),
    };
    encoded.map_err(|source| PersistError::Encode { slice, source })
}
