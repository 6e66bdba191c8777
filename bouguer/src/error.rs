/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the crate-wide error type shared by every processing stage and I/O routine.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Errors raised by the gravity processing pipeline.
//!
//! Every failure is fatal to the run that produced it: stages return the first
//! error they hit through `?` and no partial results are kept.

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::region::Region;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while loading, processing or saving gravity data.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Two arrays, columns or grids that must agree in shape do not.
    #[error("{context}: shape mismatch (expected {expected:?}, found {found:?})")]
    InputShapeMismatch {
        context: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Nothing was left after restricting data to a region.
    #[error("{context}: no data left inside {region} ({num_input} input values)")]
    EmptyRegion {
        context: String,
        region: Region,
        num_input: usize,
    },

    /// The damped normal equations could not be factorised reliably.
    #[error(
        "{context}: ill-conditioned fit (condition estimate {condition_estimate:.3e}, \
         {num_sources} sources, damping {damping})"
    )]
    IllConditionedFit {
        context: String,
        condition_estimate: f64,
        num_sources: usize,
        damping: f64,
    },

    /// A stage needs a derived column that has not been computed yet.
    #[error("missing column {column:?}")]
    MissingColumn { column: String },

    /// A derived column would overwrite an existing one.
    #[error("column {column:?} already exists")]
    DuplicateColumn { column: String },

    /// A configuration value is out of range.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A NaN or infinity was supplied or produced.
    #[error("{context}: non-finite value at index {index}")]
    NonFiniteValue { context: String, index: usize },

    /// Failed to open an existing file for reading.
    #[error("opening {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Failed to create or write a file.
    #[error("creating {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    /// Malformed CSV content.
    #[error("reading CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// A CSV field could not be parsed as a number.
    #[error("parsing {field:?} on line {line} of {}: {source}", path.display())]
    ParseFloat {
        path: PathBuf,
        line: usize,
        field: String,
        source: std::num::ParseFloatError,
    },

    /// Error serializing a configuration to JSON.
    #[error("serializing JSON to {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Error parsing JSON from disk.
    #[error("parsing JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The JSON `format` field does not match.
    #[error("unsupported format {found:?} (expected {expected:?}) in {}", path.display())]
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    /// The JSON `version` field does not match.
    #[error("unsupported version {found} (expected {expected}) in {}", path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl PipelineError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Returns a [`PipelineError::NonFiniteValue`] for the first non-finite entry of `values`.
pub(crate) fn ensure_finite<'a, I>(context: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    match values.into_iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PipelineError::NonFiniteValue {
            context: context.to_string(),
            index,
        }),
        None => Ok(()),
    }
}
