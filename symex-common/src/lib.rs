//! Shared library for the symex experiment backend.
//!
//! Holds everything both binaries need: the error type, configuration
//! resolution, database initialization and schema, typed models, and the
//! store functions that read and write experiment data.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod vocab;

pub use error::{Error, Result};
