use serde::{Deserialize, Serialize};

use super::ProjectId;
use crate::domain::ValidationError;

/// An optional grouping that entries may point at.
///
/// Projects do not own entries; membership is found by scanning entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub notes: String,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: String::new(),
            start_date: String::new(),
            notes: String::new(),
        }
    }

    pub(crate) fn from_new(id: ProjectId, new: NewProject) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            location: new.location.trim().to_string(),
            start_date: new.start_date.trim().to_string(),
            notes: new.notes.trim().to_string(),
        }
    }

    pub(crate) fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(location) = patch.location {
            self.location = location.trim().to_string();
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date.trim().to_string();
        }
        if let Some(notes) = patch.notes {
            self.notes = notes.trim().to_string();
        }
    }
}

/// Fields for a project that does not have an id yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub location: String,
    pub start_date: String,
    pub notes: String,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingProjectName);
        }
        Ok(())
    }
}

/// Partial update of a [`Project`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub notes: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(ValidationError::MissingProjectName),
            _ => Ok(()),
        }
    }
}
