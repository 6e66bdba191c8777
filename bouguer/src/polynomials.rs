/////////////////////////////////////////////////////////////////////////////////////////////
//
// Evaluates the scaled linear polynomial drift used alongside the spline interpolant.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use bouguer_utils::get_pointarray_extents;
use faer::Mat;

/// Linear polynomial drift `c0 + c1 x + c2 y + ...` in coordinates scaled to `[-1, 1]`.
///
/// Scaling keeps the drift columns of the same order as the kernel entries,
/// which matters for projected coordinates in the millions of metres.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDrift {
    translation_factor: Vec<f64>,
    scale_factor: Vec<f64>,
}

impl LinearDrift {
    /// Derives the scaling from the bounding box of `points`.
    pub fn new(points: &Mat<f64>) -> Self {
        let dimensions = points.ncols();
        let extents = get_pointarray_extents(points);

        let (translation_factor, scale_factor) = match extents.is_empty() {
            true => (vec![0.0; dimensions], vec![1.0; dimensions]),
            false => (0..dimensions)
                .map(|d| {
                    let (lo, hi) = (extents[d], extents[d + dimensions]);
                    let half = 0.5 * (hi - lo);
                    (0.5 * (hi + lo), if half == 0.0 { 1.0 } else { half })
                })
                .unzip(),
        };

        Self {
            translation_factor,
            scale_factor,
        }
    }

    /// Number of drift terms.
    pub fn basis_size(&self) -> usize {
        self.scale_factor.len() + 1
    }

    /// Monomial matrix `[1, x', y', ...]` with one row per point.
    pub fn evaluate(&self, points: &Mat<f64>) -> Mat<f64> {
        Mat::from_fn(points.nrows(), self.basis_size(), |i, j| match j {
            0 => 1.0,
            _ => (points[(i, j - 1)] - self.translation_factor[j - 1]) / self.scale_factor[j - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    #[test]
    fn monomials_scaled_to_unit_square() {
        let points = mat![[0.0, 10.0], [4.0, 30.0], [2.0, 20.0f64]];
        let drift = LinearDrift::new(&points);
        let monomials = drift.evaluate(&points);

        let expected = mat![[1.0, -1.0, -1.0], [1.0, 1.0, 1.0], [1.0, 0.0, 0.0f64]];
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * 3.0);
        assert!(&monomials ~ &expected);
    }

    #[test]
    fn flat_axis_is_not_scaled() {
        let points = mat![[0.0, 5.0], [2.0, 5.0f64]];
        let drift = LinearDrift::new(&points);
        let monomials = drift.evaluate(&mat![[1.0, 7.0f64]]);
        assert!(monomials == mat![[1.0, 0.0, 2.0f64]]);
    }
}
