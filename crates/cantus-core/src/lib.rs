//! Core domain model for cantus.
//!
//! This crate defines the song and collection-result types, the identifier
//! sanitizer used for on-disk keys, and the file-backed lyrics store plus
//! its tabular (CSV) exports.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod sanitize;
pub mod store;

pub use error::{Error, Result};
pub use sanitize::sanitize;
