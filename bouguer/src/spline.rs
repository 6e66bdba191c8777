/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a thin-plate spline gridder with linear drift, solved as a dense saddle system.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # spline
//!
//! Thin-plate spline interpolation of scattered 2D data.
//!
//! The interpolant is `s(x) = Σ λ_j φ(|x - x_j|) + p(x)` with
//! `φ(r) = r² ln r` and a linear polynomial `p`. Weights and drift
//! coefficients come from the saddle point system
//!
//! ```text
//! | A + μI  P | | λ |   | d |
//! | Pᵀ      0 | | c | = | 0 |
//! ```
//!
//! solved directly with a partially pivoted LU factorisation. Coordinates are
//! centred and divided by a single length scale before the kernel is applied,
//! which leaves the interpolant unchanged but keeps the kernel entries near one
//! for projected coordinates. Queries outside the bounding box of the data are
//! clamped onto it before evaluation.
//!
//! # References
//! 1. Fasshauer, G., 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.

use bouguer_utils::{KernelType, get_a_matrix, get_a_matrix_symmetric, get_pointarray_extents};
use faer::{Mat, concat, linalg::solvers::Solve};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::gridders::{Gridder, Predictor, check_fit_inputs, clamp_to_extents};
use crate::polynomials::LinearDrift;

/// Thin-plate spline settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SplineGridder {
    /// Smoothing term added to the diagonal of the normalised kernel matrix.
    /// Zero interpolates exactly.
    pub damping: f64,
}

impl SplineGridder {
    pub fn new(damping: f64) -> Self {
        Self { damping }
    }
}

/// A fitted thin-plate spline.
#[derive(Debug, Clone)]
pub struct SplineModel {
    /// Data points in normalised coordinates.
    points: Mat<f64>,
    weights: Mat<f64>,
    drift_coefficients: Mat<f64>,
    drift: LinearDrift,
    extents: Vec<f64>,
    centre: [f64; 2],
    length_scale: f64,
}

/// Centres `points` on `centre` and divides by `length_scale`.
fn normalise(points: &Mat<f64>, centre: [f64; 2], length_scale: f64) -> Mat<f64> {
    Mat::from_fn(points.nrows(), 2, |i, j| (points[(i, j)] - centre[j]) / length_scale)
}

impl Gridder for SplineGridder {
    type Model = SplineModel;

    fn fit(&self, coordinates: &Mat<f64>, values: &[f64]) -> Result<SplineModel> {
        check_fit_inputs("spline fit", coordinates, values, 2)?;

        if self.damping.is_nan() || self.damping < 0.0 {
            return Err(PipelineError::invalid(
                "spline damping",
                self.damping,
                "must be non-negative",
            ));
        }

        let points = coordinates.subcols(0, 2).to_owned();
        let n = points.nrows();
        let drift = LinearDrift::new(&points);
        let m = drift.basis_size();

        if n < m {
            return Err(PipelineError::InputShapeMismatch {
                context: "spline fit needs at least as many points as drift terms".into(),
                expected: (m, 2),
                found: (n, 2),
            });
        }

        let extents = get_pointarray_extents(&points);
        let centre = [0.5 * (extents[0] + extents[2]), 0.5 * (extents[1] + extents[3])];
        let half = 0.5 * (extents[2] - extents[0]).max(extents[3] - extents[1]);
        let length_scale = if half > 0.0 { half } else { 1.0 };
        let scaled = normalise(&points, centre, length_scale);

        let a = get_a_matrix_symmetric(&scaled, KernelType::ThinPlateSpline, self.damping);
        let p = drift.evaluate(&points);
        let pt = p.transpose().to_owned();
        let zeros = Mat::<f64>::zeros(m, m);

        let lhs = concat![[a, p], [pt, zeros]];
        let rhs = Mat::from_fn(n + m, 1, |i, _| if i < n { values[i] } else { 0.0 });

        let lu = lhs.partial_piv_lu();
        let solution = lu.solve(&rhs);

        if solution.col(0).iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::IllConditionedFit {
                context: "thin-plate spline saddle system is singular".into(),
                condition_estimate: f64::INFINITY,
                num_sources: n,
                damping: self.damping,
            });
        }

        let (weights, drift_coefficients) = solution.split_at_row(n);

        Ok(SplineModel {
            points: scaled,
            weights: weights.to_owned(),
            drift_coefficients: drift_coefficients.to_owned(),
            drift,
            extents,
            centre,
            length_scale,
        })
    }
}

impl Predictor for SplineModel {
    fn predict(&self, coordinates: &Mat<f64>) -> Result<Vec<f64>> {
        if coordinates.ncols() < 2 {
            return Err(PipelineError::InputShapeMismatch {
                context: "spline prediction coordinates".into(),
                expected: (coordinates.nrows(), 2),
                found: coordinates.shape(),
            });
        }

        let queries = clamp_to_extents(coordinates, &self.extents);
        let scaled = normalise(&queries, self.centre, self.length_scale);
        let a = get_a_matrix(&scaled, &self.points, KernelType::ThinPlateSpline);
        let p = self.drift.evaluate(&queries);

        let predicted = a.as_ref() * self.weights.as_ref() + p.as_ref() * self.drift_coefficients.as_ref();
        Ok(predicted.col(0).iter().copied().collect())
    }
}
