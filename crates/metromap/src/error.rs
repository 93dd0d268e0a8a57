//! Error types for metro map generation.
//!
//! This module provides the main error type [`MetroMapError`] which wraps
//! the error conditions of every pipeline stage.

use std::io;

use thiserror::Error;

use metromap_parser::error::ParseError;

/// The main error type for metro map generation.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source code
/// spans. This provides detailed error information that can be used for rich
/// error reporting.
#[derive(Debug, Error)]
pub enum MetroMapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),
}

impl MetroMapError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
