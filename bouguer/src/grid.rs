/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds regular geographic grids and evaluates fitted source models on them.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;

use crate::error::{PipelineError, Result, ensure_finite};
use crate::gridders::Predictor;
use crate::projection::Projection;
use crate::region::Region;
use crate::reproject::linspace;

/// Gridline-registered node coordinates `(x, y)` covering `region`.
///
/// Each axis gets `round(extent / spacing) + 1` nodes and the spacing is
/// adjusted so the first and last nodes sit exactly on the region edges.
pub fn grid_coordinates(region: &Region, spacing: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    region.validate()?;
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(PipelineError::invalid("grid spacing", spacing, "must be finite and positive"));
    }

    let nx = (region.width() / spacing).round() as usize + 1;
    let ny = (region.height() / spacing).round() as usize + 1;

    Ok((
        linspace(region.west, region.east, nx),
        linspace(region.south, region.north, ny),
    ))
}

/// Regular latitude/longitude grid of a field at a fixed height.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGrid {
    pub name: String,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    /// Height (m) every node was evaluated at.
    pub height: f64,
    /// `latitude.len() x longitude.len()` values.
    pub values: Mat<f64>,
}

impl OutputGrid {
    /// `(latitude, longitude)` sizes.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Nodes as `(longitude, latitude, value)` rows, longitude varying fastest.
    pub fn to_table(&self) -> Vec<[f64; 3]> {
        let mut rows = Vec::with_capacity(self.latitude.len() * self.longitude.len());
        for (i, lat) in self.latitude.iter().enumerate() {
            for (j, lon) in self.longitude.iter().enumerate() {
                rows.push([*lon, *lat, self.values[(i, j)]]);
            }
        }
        rows
    }
}

/// Evaluates `model` on a geographic grid over `region` at `height` metres.
///
/// Nodes are projected with `projection` before prediction, so the model must
/// have been fitted in the same planar coordinates.
pub fn grid_model<P>(
    name: &str,
    model: &P,
    region: &Region,
    spacing: f64,
    height: f64,
    projection: &dyn Projection,
) -> Result<OutputGrid>
where
    P: Predictor,
{
    if !height.is_finite() {
        return Err(PipelineError::invalid("grid height", height, "must be finite"));
    }

    let (longitude, latitude) = grid_coordinates(region, spacing)?;
    let nx = longitude.len();
    let n = nx * latitude.len();

    let (lon, lat): (Vec<f64>, Vec<f64>) = (0..n).map(|k| (longitude[k % nx], latitude[k / nx])).unzip();
    let (easting, northing) = projection.forward_many(&lon, &lat);

    let coordinates = Mat::from_fn(n, 3, |i, j| match j {
        0 => easting[i],
        1 => northing[i],
        _ => height,
    });

    let predicted = model.predict(&coordinates)?;
    ensure_finite(&format!("grid {name:?}"), predicted.iter())?;

    let values = Mat::from_fn(latitude.len(), nx, |i, j| predicted[i * nx + j]);

    Ok(OutputGrid {
        name: name.to_string(),
        longitude,
        latitude,
        height,
        values,
    })
}
