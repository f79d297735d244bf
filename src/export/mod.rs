//! Machine-readable run reports

pub mod json;

pub use json::{write_report, RunReport};
