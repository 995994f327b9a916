use serde::{Deserialize, Serialize};

pub const DEFAULT_START: &str = "08:00";
pub const DEFAULT_END: &str = "16:00";

/// The single user-profile record.
///
/// Missing fields in stored data fall back to their defaults, so older
/// payloads keep loading as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub first_name: String,
    pub last_name: String,
    /// Prefilled start time for new entries.
    pub default_start: String,
    /// Prefilled end time for new entries.
    pub default_end: String,
    pub birth_date: String,
    pub citizenship: String,
    pub bsn: String,
    pub id_number: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub vca: bool,
    pub vca_number: String,
    pub vca_expiry: String,
    pub vca_added: String,
    pub driver_license: bool,
    pub own_transport: bool,
    pub gpi: bool,
    pub kvk: bool,
    pub kvk_number: String,
    pub btw: bool,
    pub btw_number: String,
    pub personal_note: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            default_start: DEFAULT_START.to_string(),
            default_end: DEFAULT_END.to_string(),
            birth_date: String::new(),
            citizenship: String::new(),
            bsn: String::new(),
            id_number: String::new(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            vca: false,
            vca_number: String::new(),
            vca_expiry: String::new(),
            vca_added: String::new(),
            driver_license: false,
            own_transport: false,
            gpi: false,
            kvk: false,
            kvk_number: String::new(),
            btw: false,
            btw_number: String::new(),
            personal_note: String::new(),
        }
    }
}

impl Configuration {
    /// "First Last", trimmed. Stamped onto entries at save time.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Start time to prefill, falling back to [`DEFAULT_START`] when unset.
    pub fn start_or_default(&self) -> &str {
        non_blank(&self.default_start).unwrap_or(DEFAULT_START)
    }

    /// End time to prefill, falling back to [`DEFAULT_END`] when unset.
    pub fn end_or_default(&self) -> &str {
        non_blank(&self.default_end).unwrap_or(DEFAULT_END)
    }

    /// Merge every field set in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: ConfigurationPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        merge!(
            first_name,
            last_name,
            default_start,
            default_end,
            birth_date,
            citizenship,
            bsn,
            id_number,
            address,
            phone,
            email,
            vca,
            vca_number,
            vca_expiry,
            vca_added,
            driver_license,
            own_transport,
            gpi,
            kvk,
            kvk_number,
            btw,
            btw_number,
            personal_note,
        );
    }
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Partial update of [`Configuration`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub default_start: Option<String>,
    pub default_end: Option<String>,
    pub birth_date: Option<String>,
    pub citizenship: Option<String>,
    pub bsn: Option<String>,
    pub id_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vca: Option<bool>,
    pub vca_number: Option<String>,
    pub vca_expiry: Option<String>,
    pub vca_added: Option<String>,
    pub driver_license: Option<bool>,
    pub own_transport: Option<bool>,
    pub gpi: Option<bool>,
    pub kvk: Option<bool>,
    pub kvk_number: Option<String>,
    pub btw: Option<bool>,
    pub btw_number: Option<String>,
    pub personal_note: Option<String>,
}
