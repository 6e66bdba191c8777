/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the fit/predict interface shared by the interpolation and source-model backends.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Fit/predict interface.
//!
//! A [`Gridder`] holds the settings of an estimator and fits them to scattered
//! data, producing a [`Predictor`] that evaluates the fitted model anywhere.

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Fits a model to values observed at scattered coordinates.
///
/// `coordinates` has one row per observation; the number of columns expected
/// depends on the backend.
pub trait Gridder {
    type Model: Predictor;

    fn fit(&self, coordinates: &Mat<f64>, values: &[f64]) -> Result<Self::Model>;
}

/// Evaluates a fitted model at new coordinates.
pub trait Predictor {
    fn predict(&self, coordinates: &Mat<f64>) -> Result<Vec<f64>>;
}

/// Interpolator used to carry geoid heights from the raster to the observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeoidInterpolation {
    /// Thin-plate spline with linear drift, fitted to the nodes around each query.
    #[default]
    Spline,

    /// Value of the closest raster node.
    Nearest,
}

/// Checks the shared preconditions of every `fit` call.
pub(crate) fn check_fit_inputs(
    context: &str,
    coordinates: &Mat<f64>,
    values: &[f64],
    min_cols: usize,
) -> Result<()> {
    if coordinates.nrows() != values.len() || coordinates.ncols() < min_cols {
        return Err(PipelineError::InputShapeMismatch {
            context: context.to_string(),
            expected: (values.len(), min_cols),
            found: coordinates.shape(),
        });
    }
    crate::error::ensure_finite(context, values.iter())?;
    for col in coordinates.col_iter() {
        crate::error::ensure_finite(context, col.iter())?;
    }
    Ok(())
}

/// Returns the query coordinates (first `extents.len() / 2` columns) clamped
/// into the `[mins..., maxs...]` box.
pub(crate) fn clamp_to_extents(coordinates: &Mat<f64>, extents: &[f64]) -> Mat<f64> {
    let d = extents.len() / 2;
    Mat::from_fn(coordinates.nrows(), d, |i, j| {
        coordinates[(i, j)].clamp(extents[j], extents[j + d])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn clamp_moves_outside_points_to_the_box() {
        let queries = mat![[-1.0, 0.5, 9.0], [2.0, 3.0, 9.0], [0.5, 0.5, 9.0f64]];
        let clamped = clamp_to_extents(&queries, &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(clamped, mat![[0.0, 0.5], [1.0, 1.0], [0.5, 0.5f64]]);
    }

    #[test]
    fn fit_inputs_must_agree() {
        let coords = mat![[0.0, 0.0], [1.0, 1.0f64]];
        assert!(check_fit_inputs("t", &coords, &[1.0, 2.0], 2).is_ok());
        assert!(check_fit_inputs("t", &coords, &[1.0], 2).is_err());
        assert!(check_fit_inputs("t", &coords, &[1.0, 2.0], 3).is_err());
        assert!(matches!(
            check_fit_inputs("t", &coords, &[1.0, f64::NAN], 2),
            Err(PipelineError::NonFiniteValue { index: 1, .. })
        ));
    }
}
