/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete kernel functions used by the gridders and equivalent sources.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    KernelFunction,
    constants::{GRAVITATIONAL_CONST, MGAL_PER_MPS2},
};
use faer::RowRef;

/// Thin plate spline kernel with `phi(r) = r^2 log r`.
///
/// The biharmonic Green's function in two dimensions. Requires a linear drift
/// for the interpolation system to be uniquely solvable.
#[derive(Clone, Debug, Copy, Default)]
pub struct ThinPlateSplineKernel;

impl ThinPlateSplineKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64) -> f64 {
        match r.abs() < f64::EPSILON {
            true => 0.0,
            false => r.powi(2) * r.ln(),
        }
    }
}

impl KernelFunction for ThinPlateSplineKernel {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        let r = crate::get_distance(target, source);
        self.phi(r)
    }
}

/// Green's function of the Laplace equation, `phi(r) = 1 / r`.
///
/// Equivalent sources fitted with this kernel are harmonic everywhere above
/// the source layer. The singular value at `r = 0` is defined as zero, which
/// never occurs for sources placed below the data.
#[derive(Clone, Debug, Copy, Default)]
pub struct InverseDistanceKernel;

impl InverseDistanceKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64) -> f64 {
        match r.abs() < f64::EPSILON {
            true => 0.0,
            false => 1.0 / r,
        }
    }
}

impl KernelFunction for InverseDistanceKernel {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        let r = crate::get_distance(target, source);
        self.phi(r)
    }
}

/// Downward vertical gravitational acceleration, in mGal, of a unit point
/// mass (1 kg).
///
/// Points are `(easting, northing, upward)`. A mass located below the target
/// produces a positive value.
#[derive(Clone, Debug, Copy, Default)]
pub struct PointMassGzKernel;

impl KernelFunction for PointMassGzKernel {
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        let r2 = crate::get_distance_sq(target, source);
        if r2 < f64::EPSILON {
            return 0.0;
        }
        let dz = target[2] - source[2];
        GRAVITATIONAL_CONST * MGAL_PER_MPS2 * dz / (r2 * r2.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn thin_plate_spline_vanishes_at_zero_and_one() {
        let k = ThinPlateSplineKernel;
        assert_eq!(k.phi(0.0), 0.0);
        assert_eq!(k.phi(1.0), 0.0);
        assert!((k.phi(2.0) - 4.0 * 2f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn inverse_distance_matches_reciprocal() {
        let points = mat![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0f64]];
        let v = InverseDistanceKernel.evaluate(points.row(0), points.row(1));
        assert!((v - 0.2).abs() < 1e-15);
    }

    #[test]
    fn point_mass_is_positive_above_the_mass() {
        let points = mat![[0.0, 0.0, 100.0], [0.0, 0.0, 0.0f64]];
        let above = PointMassGzKernel.evaluate(points.row(0), points.row(1));
        let below = PointMassGzKernel.evaluate(points.row(1), points.row(0));

        let expected = GRAVITATIONAL_CONST * MGAL_PER_MPS2 / 100.0f64.powi(2);
        assert!((above - expected).abs() < 1e-12 * expected);
        assert!((below + expected).abs() < 1e-12 * expected);
    }
}
