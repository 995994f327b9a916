mod error;
pub mod hours;
pub mod models;
pub mod ports;
pub mod queries;

pub use error::*;
