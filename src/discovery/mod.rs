//! Input discovery

pub mod scanner;

pub use scanner::{absolute_root, scan};
