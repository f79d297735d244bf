//! Audio file model
//!
//! Classification, tag loading and the decode protocol. Every codec
//! operation is delegated to an external program through [`crate::tools`].

mod file;
pub mod tags;

pub use file::{classify, AudioFile};
