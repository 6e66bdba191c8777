/////////////////////////////////////////////////////////////////////////////////////////////
//
// Reprojects geographic rasters onto regular planar grids with optional block-mean antialiasing.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Raster reprojection.
//!
//! Cell centres are pushed through the projection, a regular planar grid of the
//! same shape is laid over their bounding box and every output node takes the
//! value of the closest projected sample. With antialiasing the samples are first
//! averaged over blocks the size of an output cell, which keeps high-frequency
//! content of dense inputs out of the coarser output. Edges of the output can
//! still show nearest neighbour aliasing.

use faer::Mat;
use rayon::prelude::*;

use crate::error::{PipelineError, Result};
use crate::projection::Projection;
use crate::raster::{CoordinateKind, Raster};
use crate::region::Region;
use crate::spatial::PointIndex;

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Scattered planar samples.
#[derive(Debug, Clone, Default)]
struct Samples {
    x: Vec<f64>,
    y: Vec<f64>,
    values: Vec<f64>,
}

/// Averages coordinates and values of the samples falling in each block.
///
/// Blocks are centred on the output nodes; a sample belongs to the block of the
/// nearest node. Empty blocks produce no sample.
fn block_mean(samples: &Samples, xs: &[f64], ys: &[f64]) -> Samples {
    let nx = xs.len();
    let ny = ys.len();
    let dx = (xs[nx - 1] - xs[0]) / (nx - 1) as f64;
    let dy = (ys[ny - 1] - ys[0]) / (ny - 1) as f64;

    let label = |c: f64, origin: f64, step: f64, n: usize| {
        (((c - origin) / step).round().max(0.0) as usize).min(n - 1)
    };

    // (sum x, sum y, sum value, count)
    let mut blocks = vec![(0.0, 0.0, 0.0, 0usize); nx * ny];
    for k in 0..samples.values.len() {
        let col = label(samples.x[k], xs[0], dx, nx);
        let row = label(samples.y[k], ys[0], dy, ny);
        let block = &mut blocks[row * nx + col];
        block.0 += samples.x[k];
        block.1 += samples.y[k];
        block.2 += samples.values[k];
        block.3 += 1;
    }

    let mut reduced = Samples::default();
    for (sx, sy, sv, count) in blocks.into_iter().filter(|b| b.3 > 0) {
        let n = count as f64;
        reduced.x.push(sx / n);
        reduced.y.push(sy / n);
        reduced.values.push(sv / n);
    }
    reduced
}

/// Reprojects a geographic raster onto a planar grid with the same shape.
///
/// Non-finite input cells are ignored. The output spans the bounding box of
/// the projected cell centres.
pub fn project_raster(raster: &Raster, projection: &dyn Projection, antialias: bool) -> Result<Raster> {
    if raster.kind != CoordinateKind::Geographic {
        return Err(PipelineError::invalid(
            "raster",
            &raster.name,
            "only geographic rasters can be projected",
        ));
    }

    let (ny, nx) = raster.shape();
    if nx < 2 || ny < 2 {
        return Err(PipelineError::InputShapeMismatch {
            context: format!("projecting raster {:?} needs at least 2 x 2 nodes", raster.name),
            expected: (2, 2),
            found: (ny, nx),
        });
    }

    let (coords, values) = raster.to_table();
    let lon = coords.col(0).iter().copied().collect::<Vec<_>>();
    let lat = coords.col(1).iter().copied().collect::<Vec<_>>();
    let (easting, northing) = projection.forward_many(&lon, &lat);

    let extent = Region::bounding(&easting, &northing).ok_or_else(|| PipelineError::EmptyRegion {
        context: format!("projecting raster {:?}", raster.name),
        region: raster.region(),
        num_input: 0,
    })?;

    let xs = linspace(extent.west, extent.east, nx);
    let ys = linspace(extent.south, extent.north, ny);

    let mut samples = Samples::default();
    for k in 0..values.len() {
        if values[k].is_finite() {
            samples.x.push(easting[k]);
            samples.y.push(northing[k]);
            samples.values.push(values[k]);
        }
    }

    if samples.values.is_empty() {
        return Err(PipelineError::NonFiniteValue {
            context: format!("raster {:?} has no finite values to project", raster.name),
            index: 0,
        });
    }

    if antialias {
        samples = block_mean(&samples, &xs, &ys);
    }

    let index = PointIndex::new(&samples.x, &samples.y);

    let assigned = (0..nx * ny)
        .into_par_iter()
        .map(|k| {
            index
                .nearest(xs[k % nx], ys[k / nx])
                .map(|i| samples.values[i])
                .unwrap_or(f64::NAN)
        })
        .collect::<Vec<_>>();

    let grid = Mat::from_fn(ny, nx, |i, j| assigned[i * nx + j]);

    Raster::new(raster.name.clone(), CoordinateKind::Projected, xs, ys, grid)
}
