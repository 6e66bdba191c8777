/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the column-oriented observation table that accumulates derived columns per stage.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Point gravity observations.
//!
//! An [`ObservationTable`] starts with the four measured columns and grows one
//! derived column at a time. Columns are never removed or overwritten and rows
//! keep their order, so every derived value can be traced back to the input row
//! it came from through [`ObservationTable::original_indices`].

use faer::Mat;

use crate::error::{PipelineError, Result};

/// Column names used by the pipeline.
pub mod columns {
    pub const LONGITUDE: &str = "longitude";
    pub const LATITUDE: &str = "latitude";
    pub const HEIGHT_SEA_LEVEL: &str = "height_sea_level_m";
    pub const GRAVITY: &str = "gravity_mgal";
    pub const EASTING: &str = "easting";
    pub const NORTHING: &str = "northing";
    pub const GEOID: &str = "geoid";
    pub const HEIGHT_GEOMETRIC: &str = "height_geometric_m";
    pub const NORMAL_GRAVITY: &str = "normal_gravity_mgal";
    pub const DISTURBANCE: &str = "gravity_disturbance_mgal";
    pub const TERRAIN_EFFECT: &str = "terrain_effect_mgal";
    pub const BOUGUER: &str = "gravity_bouguer_mgal";
    pub const REGIONAL: &str = "gravity_regional_mgal";
    pub const RESIDUAL: &str = "gravity_residual_mgal";

    /// Measured columns every table starts with.
    pub const BASE: [&str; 4] = [LONGITUDE, LATITUDE, HEIGHT_SEA_LEVEL, GRAVITY];
}

/// Ordered, column-oriented table of gravity observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    names: Vec<String>,
    values: Vec<Vec<f64>>,
    original_index: Vec<usize>,
}

impl ObservationTable {
    /// Builds a table from the measured columns.
    ///
    /// All four slices must have the same length.
    pub fn new(
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        height_sea_level: Vec<f64>,
        gravity: Vec<f64>,
    ) -> Result<Self> {
        let n = longitude.len();
        let mut table = Self {
            names: Vec::new(),
            values: Vec::new(),
            original_index: (0..n).collect(),
        };
        table.push_column(columns::LONGITUDE, longitude)?;
        table.push_column(columns::LATITUDE, latitude)?;
        table.push_column(columns::HEIGHT_SEA_LEVEL, height_sea_level)?;
        table.push_column(columns::GRAVITY, gravity)?;
        Ok(table)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.original_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_index.is_empty()
    }

    /// Column names in the order they were added.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns a column by name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i].as_slice())
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Index of every row in the table the data was first loaded into.
    pub fn original_indices(&self) -> &[usize] {
        &self.original_index
    }

    /// Appends a derived column in place.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if self.has_column(name) {
            return Err(PipelineError::DuplicateColumn {
                column: name.to_string(),
            });
        }
        if values.len() != self.len() {
            return Err(PipelineError::InputShapeMismatch {
                context: format!("column {name:?}"),
                expected: (self.len(), 1),
                found: (values.len(), 1),
            });
        }
        self.names.push(name.to_string());
        self.values.push(values);
        Ok(())
    }

    /// Returns a copy of the table with one more column.
    pub fn with_column(&self, name: &str, values: Vec<f64>) -> Result<Self> {
        let mut table = self.clone();
        table.push_column(name, values)?;
        Ok(table)
    }

    /// Returns the rows at `indices`, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self
                .values
                .iter()
                .map(|col| indices.iter().map(|&i| col[i]).collect())
                .collect(),
            original_index: indices.iter().map(|&i| self.original_index[i]).collect(),
        }
    }

    /// Stacks named columns into an `n x k` matrix.
    pub fn to_mat(&self, names: &[&str]) -> Result<Mat<f64>> {
        let cols = names
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Mat::from_fn(self.len(), cols.len(), |i, j| cols[j][i]))
    }

    /// Iterates over `(name, values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(self.values.iter())
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}
