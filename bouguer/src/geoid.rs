/////////////////////////////////////////////////////////////////////////////////////////////
//
// Resolves geometric heights from orthometric heights and a geoid height raster.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Conversion between heights above sea level (the geoid) and heights above
//! the reference ellipsoid: `h_geometric = h_sea_level + N_geoid`.

use std::ops::Range;

use bouguer_utils::select_mat_rows;
use faer::Mat;
use rayon::prelude::*;

use crate::error::{PipelineError, Result};
use crate::gridders::{GeoidInterpolation, Gridder, Predictor};
use crate::nearest::NearestGridder;
use crate::raster::Raster;
use crate::spline::SplineGridder;

/// Name given to the topography-above-ellipsoid raster.
pub const TOPOGRAPHY_GEOMETRIC: &str = "topography_geometric";

/// Topography referenced to the ellipsoid, from projected topography and geoid
/// rasters on the same grid.
pub fn geometric_topography(topography: &Raster, geoid: &Raster) -> Result<Raster> {
    topography.add(geoid, TOPOGRAPHY_GEOMETRIC)
}

/// Raster nodes per axis in the window each spline evaluation is fitted to.
const SPLINE_WINDOW: usize = 4;

/// Interpolates geoid heights at planar `(easting, northing)` points.
///
/// Non-finite raster nodes are left out of the fit. The spline method is
/// local: every query fits a thin-plate spline to the
/// `SPLINE_WINDOW × SPLINE_WINDOW` block of nodes around the cell holding it,
/// so the cost grows with the number of queries and not with the raster size.
/// Queries outside the raster use the block on its nearest edge.
pub fn geoid_at_points(
    geoid: &Raster,
    easting: &[f64],
    northing: &[f64],
    method: GeoidInterpolation,
) -> Result<Vec<f64>> {
    if easting.len() != northing.len() {
        return Err(PipelineError::InputShapeMismatch {
            context: "geoid query coordinates".into(),
            expected: (easting.len(), 2),
            found: (northing.len(), 2),
        });
    }

    match method {
        GeoidInterpolation::Spline => easting
            .par_iter()
            .zip(northing.par_iter())
            .map(|(&e, &n)| local_spline(geoid, e, n))
            .collect(),
        GeoidInterpolation::Nearest => {
            let (coords, values) = geoid.to_table();
            let keep = (0..values.len()).filter(|&k| values[k].is_finite()).collect::<Vec<_>>();
            let data_coords = select_mat_rows(&coords, &keep);
            let data_values = keep.iter().map(|&k| values[k]).collect::<Vec<_>>();
            NearestGridder
                .fit(&data_coords, &data_values)?
                .predict(&query_mat(easting, northing))
        }
    }
}

fn query_mat(easting: &[f64], northing: &[f64]) -> Mat<f64> {
    Mat::from_fn(easting.len(), 2, |i, j| match j {
        0 => easting[i],
        _ => northing[i],
    })
}

/// Index range of the `SPLINE_WINDOW` nodes of an ascending axis centred on
/// the cell containing `v`.
fn window(axis: &[f64], v: f64) -> Range<usize> {
    let size = SPLINE_WINDOW.min(axis.len());
    let left = axis.partition_point(|&a| a <= v).saturating_sub(1);
    let start = left
        .saturating_sub(SPLINE_WINDOW / 2 - 1)
        .min(axis.len() - size);
    start..start + size
}

fn local_spline(geoid: &Raster, easting: f64, northing: f64) -> Result<f64> {
    let (x, y) = (geoid.x(), geoid.y());
    let values = geoid.values();

    let mut coords = Vec::with_capacity(SPLINE_WINDOW * SPLINE_WINDOW);
    let mut data = Vec::with_capacity(SPLINE_WINDOW * SPLINE_WINDOW);
    for i in window(y, northing) {
        for j in window(x, easting) {
            let v = values[(i, j)];
            if v.is_finite() {
                coords.push([x[j], y[i]]);
                data.push(v);
            }
        }
    }

    let data_coords = Mat::from_fn(coords.len(), 2, |i, j| coords[i][j]);
    let model = SplineGridder::default().fit(&data_coords, &data)?;
    let prediction = model.predict(&query_mat(&[easting], &[northing]))?;
    Ok(prediction[0])
}

/// `height_sea_level + geoid`, element-wise.
pub fn geometric_height(height_sea_level: &[f64], geoid: &[f64]) -> Result<Vec<f64>> {
    if height_sea_level.len() != geoid.len() {
        return Err(PipelineError::InputShapeMismatch {
            context: "geometric height".into(),
            expected: (height_sea_level.len(), 1),
            found: (geoid.len(), 1),
        });
    }
    Ok(height_sea_level
        .iter()
        .zip(geoid.iter())
        .map(|(h, n)| h + n)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::CoordinateKind;
    use crate::reproject::linspace;

    fn planar(name: &str, f: impl Fn(f64, f64) -> f64) -> Raster {
        let x = linspace(0.0, 90_000.0, 10);
        let y = linspace(0.0, 60_000.0, 7);
        let values = Mat::from_fn(y.len(), x.len(), |i, j| f(x[j], y[i]));
        Raster::new(name, CoordinateKind::Projected, x, y, values).unwrap()
    }

    #[test]
    fn geometric_topography_adds_cellwise() {
        let topo = planar("topography", |x, _| x / 100.0);
        let geoid = planar("geoid", |_, y| 20.0 + y / 10_000.0);
        let sum = geometric_topography(&topo, &geoid).unwrap();
        assert_eq!(sum.name, TOPOGRAPHY_GEOMETRIC);
        assert_eq!(sum.values()[(6, 9)], 900.0 + 26.0);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let topo = planar("topography", |_, _| 0.0);
        let geoid = Raster::new(
            "geoid",
            CoordinateKind::Projected,
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            Mat::zeros(2, 2),
        )
        .unwrap();
        assert!(matches!(
            geometric_topography(&topo, &geoid),
            Err(PipelineError::InputShapeMismatch { .. })
        ));
    }

    #[test]
    fn spline_recovers_planar_geoid() {
        let geoid = planar("geoid", |x, y| 25.0 + 1e-4 * x - 2e-4 * y);
        let e = [12_345.0, 50_000.0, 89_000.0];
        let n = [1_000.0, 30_000.0, 59_000.0];
        let values = geoid_at_points(&geoid, &e, &n, GeoidInterpolation::Spline).unwrap();
        for i in 0..3 {
            let expected = 25.0 + 1e-4 * e[i] - 2e-4 * n[i];
            assert!((values[i] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn spline_honours_nodes_and_curvature_locally() {
        let geoid = planar("geoid", |x, y| 30.0 + 1e-9 * (x - 40_000.0).powi(2) - 1e-4 * y);
        let at_node = geoid_at_points(&geoid, &[40_000.0], &[20_000.0], GeoidInterpolation::Spline).unwrap();
        assert!((at_node[0] - 28.0).abs() < 1e-9);

        let between = geoid_at_points(&geoid, &[45_000.0], &[25_000.0], GeoidInterpolation::Spline).unwrap();
        let expected = 30.0 + 1e-9 * 5_000.0f64.powi(2) - 2.5;
        assert!((between[0] - expected).abs() < 0.05, "{} vs {expected}", between[0]);
    }

    #[test]
    fn spline_handles_survey_sized_geoid() {
        // 5° padded region at 10' resolution
        let x = linspace(-1_100_000.0, 1_100_000.0, 102);
        let y = linspace(-900_000.0, 900_000.0, 84);
        let values = Mat::from_fn(y.len(), x.len(), |i, j| 20.0 + 2e-6 * x[j] - 3e-6 * y[i]);
        let geoid = Raster::new("geoid", CoordinateKind::Projected, x, y, values).unwrap();

        let e = (0..500).map(|k| -1_000_000.0 + 4_000.0 * k as f64).collect::<Vec<_>>();
        let n = (0..500).map(|k| 800_000.0 - 3_000.0 * k as f64).collect::<Vec<_>>();
        let result = geoid_at_points(&geoid, &e, &n, GeoidInterpolation::Spline).unwrap();
        for k in 0..500 {
            let expected = 20.0 + 2e-6 * e[k] - 3e-6 * n[k];
            assert!((result[k] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn window_stays_inside_the_axis() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(window(&axis, 2.5), 1..5);
        assert_eq!(window(&axis, -3.0), 0..4);
        assert_eq!(window(&axis, 5.0), 2..6);
        assert_eq!(window(&axis[..2], 0.5), 0..2);
    }

    #[test]
    fn nearest_returns_node_values() {
        let geoid = planar("geoid", |x, y| x + y);
        let values = geoid_at_points(&geoid, &[10_100.0], &[19_900.0], GeoidInterpolation::Nearest).unwrap();
        assert_eq!(values, vec![10_000.0 + 20_000.0]);
    }

    #[test]
    fn geometric_height_is_sum() {
        assert_eq!(geometric_height(&[100.0, 0.0], &[20.0, -5.0]).unwrap(), vec![120.0, -5.0]);
        assert!(geometric_height(&[1.0], &[]).is_err());
    }
}
