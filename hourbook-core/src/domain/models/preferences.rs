use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind of logged time. Opaque to the hours calculation and to persistence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
    #[default]
    Work,
    Overtime,
    Vacation,
}

/// Interface language. Stored as its bare code, e.g. `pl`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    Pl,
    En,
    Nl,
}

/// Colour theme. Stored as its bare name, e.g. `dark`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Onyx,
}

impl Theme {
    /// Next theme in the dark → light → onyx cycle.
    pub fn next(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Onyx,
            Theme::Onyx => Theme::Dark,
        }
    }
}
