/////////////////////////////////////////////////////////////////////////////////////////////
//
// Adds helper linear algebra routines for damped, column-scaled least squares solves.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! Damped least squares through the normal equations.
//!
//! Jacobian columns are divided by their standard deviation before forming
//! `AᵀA + λI`, so the damping acts on comparable scales whatever the kernel
//! magnitudes. The scaled system is factorised with a Cholesky decomposition
//! and the solution is mapped back to the unscaled parameters.

use bouguer_utils::std_dev;
use faer::{Mat, Side, linalg::solvers::Solve};

use crate::error::{PipelineError, Result};

/// Result of a damped least squares solve.
#[derive(Debug, Clone)]
pub struct DampedSolution {
    /// Parameters in the units of the unscaled jacobian.
    pub parameters: Vec<f64>,

    /// `(max Lᵢᵢ / min Lᵢᵢ)²` of the Cholesky factor of the scaled system.
    pub condition_estimate: f64,
}

/// Per-column population standard deviation, with zeros replaced by one.
pub(crate) fn column_scales(jacobian: &Mat<f64>) -> Vec<f64> {
    jacobian
        .col_iter()
        .map(|col| {
            let values = col.iter().copied().collect::<Vec<_>>();
            let s = std_dev(&values);
            if s == 0.0 || !s.is_finite() { 1.0 } else { s }
        })
        .collect()
}

/// Solves `min |A p - d|² + λ |S p|²` where `S` holds the column scales of `A`.
///
/// Fails with [`PipelineError::IllConditionedFit`] when the Cholesky
/// factorisation breaks down or the condition estimate exceeds `1 / ε`.
pub fn damped_least_squares(
    context: &str,
    jacobian: &Mat<f64>,
    data: &[f64],
    damping: f64,
) -> Result<DampedSolution> {
    let (m, n) = jacobian.shape();

    if data.len() != m {
        return Err(PipelineError::InputShapeMismatch {
            context: format!("{context}: jacobian rows and data"),
            expected: (m, 1),
            found: (data.len(), 1),
        });
    }
    if damping.is_nan() || damping < 0.0 {
        return Err(PipelineError::invalid("damping", damping, "must be non-negative"));
    }

    let ill_conditioned = |condition_estimate: f64| PipelineError::IllConditionedFit {
        context: context.to_string(),
        condition_estimate,
        num_sources: n,
        damping,
    };

    if n == 0 {
        return Err(ill_conditioned(f64::INFINITY));
    }

    let scale = column_scales(jacobian);
    let scaled = Mat::from_fn(m, n, |i, j| jacobian[(i, j)] / scale[j]);
    let d = Mat::from_fn(m, 1, |i, _| data[i]);

    let mut normal = scaled.transpose() * scaled.as_ref();
    for i in 0..n {
        normal[(i, i)] += damping;
    }
    let rhs = scaled.transpose() * d.as_ref();

    let llt = normal.llt(Side::Lower).map_err(|_| ill_conditioned(f64::INFINITY))?;

    let l = llt.L();
    let (min_diag, max_diag) = (0..n).fold((f64::INFINITY, 0.0f64), |(lo, hi), i| {
        let v = l[(i, i)].abs();
        (lo.min(v), hi.max(v))
    });
    let condition_estimate = match min_diag > 0.0 {
        true => (max_diag / min_diag).powi(2),
        false => f64::INFINITY,
    };

    if condition_estimate.is_nan() || condition_estimate > 1.0 / f64::EPSILON {
        return Err(ill_conditioned(condition_estimate));
    }

    let solution = llt.solve(&rhs);

    let parameters = (0..n).map(|j| solution[(j, 0)] / scale[j]).collect::<Vec<_>>();

    crate::error::ensure_finite(context, parameters.iter())?;

    Ok(DampedSolution {
        parameters,
        condition_estimate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::mat;

    #[test]
    fn undamped_square_system_is_solved_exactly() {
        let a = mat![[2.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0f64]];
        let p = [1.0, -2.0, 0.5];
        let d = (0..3)
            .map(|i| (0..3).map(|j| a[(i, j)] * p[j]).sum::<f64>())
            .collect::<Vec<_>>();

        let solution = damped_least_squares("test", &a, &d, 0.0).unwrap();
        for j in 0..3 {
            assert!((solution.parameters[j] - p[j]).abs() < 1e-12);
        }
        assert!(solution.condition_estimate >= 1.0);
    }

    #[test]
    fn overdetermined_fit_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = Mat::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
        let d = x.iter().map(|v| 3.0 - 2.0 * v).collect::<Vec<_>>();

        let solution = damped_least_squares("line", &a, &d, 0.0).unwrap();
        assert!((solution.parameters[0] - 3.0).abs() < 1e-10);
        assert!((solution.parameters[1] + 2.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_solution() {
        let a = mat![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0f64]];
        let d = [1.0, 2.0, 2.0];
        let free = damped_least_squares("t", &a, &d, 0.0).unwrap();
        let damped = damped_least_squares("t", &a, &d, 100.0).unwrap();
        let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>();
        assert!(norm(&damped.parameters) < norm(&free.parameters));
    }

    #[test]
    fn rank_deficient_system_is_ill_conditioned() {
        let a = mat![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0f64]];
        let result = damped_least_squares("rank", &a, &[1.0, 2.0, 3.0], 0.0);
        assert!(matches!(result, Err(PipelineError::IllConditionedFit { num_sources: 2, .. })));
    }

    #[test]
    fn column_scales_replace_zero_spread() {
        let a = mat![[1.0, 5.0], [3.0, 5.0f64]];
        assert!(column_scales(&a) == vec![1.0, 1.0]);
        let b = mat![[0.0, 5.0], [4.0, 5.0f64]];
        assert!(column_scales(&b) == vec![2.0, 1.0]);
    }
}
