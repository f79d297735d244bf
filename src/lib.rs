//! multicode - Batch Audio Transcoding Pipeline
//!
//! Converts every recognized audio file under one or more input folders into
//! any number of target formats in a single pass, preserving tags and the
//! relative folder layout, using a fixed pool of worker threads.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: Input folder scanning
//! - `tools`: External codec program invocation
//! - `audio`: Format classification, tag loading and decoding
//! - `encoder`: Encoder variants and the profile registry
//! - `pipeline`: Work queue, worker pool and failure reporting
//! - `export`: JSON run report
//!
//! # Example
//!
//! ```no_run
//! use multicode::config::Settings;
//! use multicode::encoder::ProfileRegistry;
//! use multicode::pipeline;
//! use std::path::PathBuf;
//!
//! let profiles = ProfileRegistry::builtin().select(&["flac", "lame-vbr2"]).unwrap();
//! let settings = Settings::new(profiles, vec![PathBuf::from("/music")], PathBuf::from("/out"));
//! let summary = pipeline::run(&settings, &settings.toolbox()).expect("Run failed");
//! println!("Encoded {} files", summary.encoded());
//! ```

pub mod audio;
pub mod config;
pub mod discovery;
pub mod encoder;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod testing;
pub mod tools;
pub mod types;

// Re-export key types at crate root
pub use audio::AudioFile;
pub use error::{MulticodeError, Result};
pub use types::{AudioFormat, FileList, TagKey, Tags};
