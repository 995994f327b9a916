use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logged [`Entry`](super::Entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a [`Project`](super::Project).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Hands out fresh ids, one past the highest id seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdCounter {
    last: u64,
}

impl IdCounter {
    /// Seed the counter so the next id is greater than every id in `existing`.
    pub fn after(existing: impl IntoIterator<Item = u64>) -> Self {
        Self {
            last: existing.into_iter().max().unwrap_or(0),
        }
    }

    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}
