/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines regular raster surfaces with cropping, cell-wise arithmetic and table conversion.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Regular raster surfaces.
//!
//! Values are stored as an `ny x nx` matrix: row `i` holds the nodes at
//! `y[i]`, column `j` the nodes at `x[j]`. Both coordinate vectors are strictly
//! ascending.

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::region::Region;

/// Whether raster coordinates are longitude/latitude or easting/northing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateKind {
    Geographic,
    Projected,
}

/// Relative tolerance used when comparing the node coordinates of two rasters.
const COORD_RTOL: f64 = 1e-9;

/// A scalar surface sampled on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub name: String,
    pub kind: CoordinateKind,
    x: Vec<f64>,
    y: Vec<f64>,
    values: Mat<f64>,
}

impl Raster {
    /// Creates a raster, checking that `values` is `y.len() x x.len()` and that
    /// both coordinate vectors are strictly ascending.
    pub fn new(
        name: impl Into<String>,
        kind: CoordinateKind,
        x: Vec<f64>,
        y: Vec<f64>,
        values: Mat<f64>,
    ) -> Result<Self> {
        let name = name.into();

        if values.shape() != (y.len(), x.len()) {
            return Err(PipelineError::InputShapeMismatch {
                context: format!("raster {name:?} values"),
                expected: (y.len(), x.len()),
                found: values.shape(),
            });
        }

        for (axis, coords) in [("x", &x), ("y", &y)] {
            if coords.is_empty() {
                return Err(PipelineError::invalid(
                    "raster coordinates",
                    format!("{name}.{axis}"),
                    "must not be empty",
                ));
            }
            if coords.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(PipelineError::invalid(
                    "raster coordinates",
                    format!("{name}.{axis}"),
                    "must be strictly ascending",
                ));
            }
        }

        Ok(Self { name, kind, x, y, values })
    }

    /// Rebuilds a raster from an unravelled `(x, y, value)` table.
    ///
    /// Rows may come in any order, but every `(x, y)` node of the implied grid
    /// must be present exactly once.
    pub fn from_table(
        name: impl Into<String>,
        kind: CoordinateKind,
        x: &[f64],
        y: &[f64],
        values: &[f64],
    ) -> Result<Self> {
        let name = name.into();

        if x.len() != y.len() || x.len() != values.len() {
            return Err(PipelineError::InputShapeMismatch {
                context: format!("raster {name:?} table columns"),
                expected: (x.len(), 3),
                found: (y.len().min(values.len()), 3),
            });
        }

        let unique = |v: &[f64]| {
            let mut u = v.to_vec();
            u.sort_by(f64::total_cmp);
            u.dedup();
            u
        };
        let xs = unique(x);
        let ys = unique(y);

        if xs.len() * ys.len() != values.len() {
            return Err(PipelineError::InputShapeMismatch {
                context: format!("raster {name:?} nodes"),
                expected: (ys.len(), xs.len()),
                found: (values.len(), 1),
            });
        }

        let mut grid = Mat::<f64>::full(ys.len(), xs.len(), f64::NAN);
        let mut seen = vec![false; values.len()];

        for ((xi, yi), v) in x.iter().zip(y.iter()).zip(values.iter()) {
            let (Ok(col), Ok(row)) = (
                xs.binary_search_by(|p| p.total_cmp(xi)),
                ys.binary_search_by(|p| p.total_cmp(yi)),
            ) else {
                continue;
            };
            let flat = row * xs.len() + col;
            if seen[flat] {
                return Err(PipelineError::InputShapeMismatch {
                    context: format!("raster {name:?} duplicate node ({xi}, {yi})"),
                    expected: (ys.len(), xs.len()),
                    found: (values.len(), 1),
                });
            }
            seen[flat] = true;
            grid[(row, col)] = *v;
        }

        Self::new(name, kind, xs, ys, grid)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn values(&self) -> &Mat<f64> {
        &self.values
    }

    /// `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Average node spacing along `(x, y)`. Zero along an axis with one node.
    pub fn spacing(&self) -> (f64, f64) {
        let step = |c: &[f64]| match c.len() {
            0 | 1 => 0.0,
            n => (c[n - 1] - c[0]) / (n - 1) as f64,
        };
        (step(&self.x), step(&self.y))
    }

    /// Region spanned by the outermost nodes.
    pub fn region(&self) -> Region {
        Region {
            west: self.x[0],
            east: self.x[self.x.len() - 1],
            south: self.y[0],
            north: self.y[self.y.len() - 1],
        }
    }

    /// Keeps the nodes whose coordinates fall inside `region` (inclusive bounds).
    ///
    /// Fails with [`PipelineError::EmptyRegion`] when fewer than two nodes
    /// survive along either axis.
    pub fn crop(&self, region: &Region) -> Result<Self> {
        let keep = |coords: &[f64], lo: f64, hi: f64| {
            coords
                .iter()
                .enumerate()
                .filter(|(_, c)| lo <= **c && **c <= hi)
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        };
        let cols = keep(&self.x, region.west, region.east);
        let rows = keep(&self.y, region.south, region.north);

        if cols.len() < 2 || rows.len() < 2 {
            return Err(PipelineError::EmptyRegion {
                context: format!("cropping raster {:?}", self.name),
                region: *region,
                num_input: self.x.len() * self.y.len(),
            });
        }

        let values = Mat::from_fn(rows.len(), cols.len(), |i, j| self.values[(rows[i], cols[j])]);

        Ok(Self {
            name: self.name.clone(),
            kind: self.kind,
            x: cols.iter().map(|&j| self.x[j]).collect(),
            y: rows.iter().map(|&i| self.y[i]).collect(),
            values,
        })
    }

    /// True if both rasters have the same shape and node coordinates.
    pub fn same_grid(&self, other: &Raster) -> bool {
        let close = |a: &[f64], b: &[f64]| {
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(p, q)| {
                    (p - q).abs() <= COORD_RTOL * p.abs().max(q.abs()).max(1.0)
                })
        };
        self.kind == other.kind && close(&self.x, &other.x) && close(&self.y, &other.y)
    }

    /// Cell-wise combination of two rasters on the same grid.
    pub fn zip_map<F>(&self, other: &Raster, name: impl Into<String>, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        if !self.same_grid(other) {
            return Err(PipelineError::InputShapeMismatch {
                context: format!("combining rasters {:?} and {:?}", self.name, other.name),
                expected: self.shape(),
                found: other.shape(),
            });
        }
        let (ny, nx) = self.shape();
        Ok(Self {
            name: name.into(),
            kind: self.kind,
            x: self.x.clone(),
            y: self.y.clone(),
            values: Mat::from_fn(ny, nx, |i, j| f(self.values[(i, j)], other.values[(i, j)])),
        })
    }

    /// Cell-wise sum of two rasters on the same grid.
    pub fn add(&self, other: &Raster, name: impl Into<String>) -> Result<Self> {
        self.zip_map(other, name, |a, b| a + b)
    }

    /// Unravels the grid into node coordinates (`n x 2`, columns `x, y`) and values.
    ///
    /// Nodes are listed row by row, with `x` varying fastest.
    pub fn to_table(&self) -> (Mat<f64>, Vec<f64>) {
        let nx = self.x.len();
        let n = nx * self.y.len();
        let coords = Mat::from_fn(n, 2, |k, c| match c {
            0 => self.x[k % nx],
            _ => self.y[k / nx],
        });
        let values = (0..n).map(|k| self.values[(k / nx, k % nx)]).collect();
        (coords, values)
    }
}
