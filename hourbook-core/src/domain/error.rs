use thiserror::Error;

use super::models::{EntryId, ProjectId};
use crate::persistence::PersistError;

/// A submitted entry or project breaks a save invariant.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("description is required")]
    MissingDescription,
    #[error("start and end time are required")]
    MissingTime,
    #[error("at least one date must be selected")]
    NoDates,
    #[error("worked hours must be greater than zero")]
    NonPositiveHours,
    #[error("project name is required")]
    MissingProjectName,
}

/// Errors returned by [`WorkLog`](crate::WorkLog) actions.
///
/// `Persist` is reported after the in-memory change has already been applied.
#[derive(Debug, Error)]
pub enum WorkLogError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl WorkLogError {
    pub fn is_persist(&self) -> bool {
        matches!(self, WorkLogError::Persist(_))
    }
}
