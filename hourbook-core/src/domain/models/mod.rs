mod app_state;
mod configuration;
mod entry;
mod ids;
mod preferences;
mod project;

pub use app_state::*;
pub use configuration::*;
pub use entry::*;
pub use ids::*;
pub use preferences::*;
pub use project::*;
