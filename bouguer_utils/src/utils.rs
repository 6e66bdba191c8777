/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances, summation, and kernel dispatch.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::KernelFunction;
use faer::{Mat, MatRef, RowRef};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use bouguer_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let sub_matrix = select_mat_rows(&matrix, &[0usize, 2]);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [0.0, 1.0],
///         [2.0, 2.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// Returns a flat vector containing the minimum and maximum values along each
/// column (dimension) of the input matrix, arranged as
/// `[min_0, min_1, ..., min_n, max_0, max_1, ..., max_n]`.
/// An empty matrix yields an empty vector.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use bouguer_utils::get_pointarray_extents;
///
/// let points = mat![
///     [1.0, 2.0],
///     [3.0, -1.0],
///     [0.5, 4.0f64]
/// ];
/// let extents = get_pointarray_extents(&points);
/// assert_eq!(extents, vec![0.5, -1.0, 3.0, 4.0]);
/// ```
#[inline(always)]
pub fn get_pointarray_extents(points: &Mat<f64>) -> Vec<f64> {
    let ncols = points.ncols();

    if points.nrows() == 0 {
        return Vec::new();
    }

    let mut extents = vec![0.0; 2 * ncols];

    for col in 0..ncols {
        extents[col] = f64::INFINITY;
        extents[col + ncols] = f64::NEG_INFINITY;
    }

    for row in points.row_iter() {
        for (col, item) in row.iter().enumerate() {
            extents[col] = extents[col].min(*item);
            extents[col + ncols] = extents[col + ncols].max(*item);
        }
    }

    extents
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use bouguer_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0],
/// ];
///
/// assert_eq!(get_distance(points.row(0), points.row(1)), 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    get_distance_sq(target, source).sqrt()
}

/// Returns the squared Euclidean distance between two points.
#[inline(always)]
pub fn get_distance_sq(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist
}

/// Arithmetic mean of a slice. Returns `NaN` for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = NeumaierSum::default();
    values.iter().for_each(|v| sum.add(*v));
    sum.total() / values.len() as f64
}

/// Population standard deviation of a slice.
#[inline]
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let mut sum = NeumaierSum::default();
    values.iter().for_each(|v| sum.add((v - m).powi(2)));
    (sum.total() / values.len() as f64).sqrt()
}

/// Compensated (Kahan-Babuska-Neumaier) running sum.
///
/// Keeps the rounding error of long sums of mixed-sign terms at the level of a
/// single addition, independent of the number of terms.
///
/// # Examples
///
/// ```
/// use bouguer_utils::NeumaierSum;
///
/// let mut sum = NeumaierSum::default();
/// for v in [1.0, 1e100, 1.0, -1e100] {
///     sum.add(v);
/// }
/// assert_eq!(sum.total(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    #[inline(always)]
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline(always)]
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Builds a dense kernel matrix using a typed kernel function.
///
/// Entry `(i, j)` holds the kernel between target row `i` and source row `j`.
/// Columns are filled in parallel.
pub fn get_a_matrix_typed<K>(
    target_points: &Mat<f64>,
    source_points: &Mat<f64>,
    kernel_function: &K,
) -> Mat<f64>
where
    K: KernelFunction,
{
    let m = target_points.nrows();
    let n = source_points.nrows();

    if m == 0 || n == 0 {
        return Mat::<f64>::zeros(m, n);
    }

    let mut buffer = vec![0.0; m * n];

    buffer
        .par_chunks_mut(m)
        .enumerate()
        .for_each(|(j, column)| {
            let source = source_points.row(j);
            column.iter_mut().enumerate().for_each(|(i, entry)| {
                *entry = kernel_function.evaluate(target_points.row(i), source);
            });
        });

    MatRef::from_column_major_slice(buffer.as_slice(), m, n).to_owned()
}

/// Builds a symmetric kernel matrix using a typed kernel function, adding a nugget on the diagonal.
pub fn get_a_matrix_symmetric_typed<K>(points: &Mat<f64>, kernel_function: &K, nugget: f64) -> Mat<f64>
where
    K: KernelFunction,
{
    let n = points.nrows();

    let mut a_matrix = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source_row = points.row(j);

        for i in j..n {
            let mut k_val = kernel_function.evaluate(points.row(i), source_row);

            if i == j {
                k_val += nugget;
            }

            a_matrix[(i, j)] = k_val;
            a_matrix[(j, i)] = k_val;
        }
    }

    a_matrix
}

// Dispatcher generated from the kernel registry below.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum KernelType {
            $( $V, )*
        }

        /// Builds a dense kernel matrix for the selected [`KernelType`].
        #[inline]
        pub fn get_a_matrix(
            target_points: &Mat<f64>,
            source_points: &Mat<f64>,
            kernel_type: KernelType,
        ) -> Mat<f64> {
            match kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty>::default();
                        get_a_matrix_typed(target_points, source_points, &k)
                    }
                ),*
            }
        }

        /// Builds a symmetric kernel matrix with a nugget term on the diagonal.
        #[inline]
        pub fn get_a_matrix_symmetric(
            points: &Mat<f64>,
            kernel_type: KernelType,
            nugget: f64,
        ) -> Mat<f64> {
            match kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty>::default();
                        get_a_matrix_symmetric_typed(points, &k, nugget)
                    }
                ),*
            }
        }

        /// Evaluates the selected kernel between a single target and source point.
        #[inline]
        pub fn kernel_value(
            target: RowRef<f64>,
            source: RowRef<f64>,
            kernel_type: KernelType,
        ) -> f64 {
            match kernel_type {
                $(
                    KernelType::$V => <$Kty>::default().evaluate(target, source)
                ),*
            }
        }
    };
}

for_each_kernel! {
    registry = [
        (ThinPlateSpline, crate::kernel_functions::ThinPlateSplineKernel),
        (InverseDistance, crate::kernel_functions::InverseDistanceKernel),
        (PointMassGz,     crate::kernel_functions::PointMassGzKernel),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    #[test]
    fn typed_matrix_matches_pointwise_evaluation() {
        let targets = mat![[0.0, 0.0, 10.0], [5.0, 1.0, 12.0], [2.0, -3.0, 8.0f64]];
        let sources = mat![[0.0, 0.0, -100.0], [1.0, 1.0, -50.0f64]];

        let a = get_a_matrix(&targets, &sources, KernelType::InverseDistance);

        assert!(a.nrows() == 3);
        assert!(a.ncols() == 2);

        let expected = Mat::from_fn(3, 2, |i, j| {
            1.0 / get_distance(targets.row(i), sources.row(j))
        });

        let approx_eq = CwiseMat(ApproxEq::eps() * 8.0);
        assert!(&a ~ &expected);
    }

    #[test]
    fn symmetric_matrix_is_symmetric_with_nugget() {
        let points = mat![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0], [3.0, 3.0f64]];
        let a = get_a_matrix_symmetric(&points, KernelType::ThinPlateSpline, 0.5);

        for i in 0..4 {
            assert!(a[(i, i)] == 0.5);
            for j in 0..4 {
                assert!(a[(i, j)] == a[(j, i)]);
            }
        }
    }

    #[test]
    fn kernel_value_agrees_with_matrix_entries() {
        let targets = mat![[3.0, 4.0, 5.0], [-2.0, 1.0, 0.5f64]];
        let sources = mat![[0.0, 0.0, -200.0], [1.0, -1.0, -20.0f64]];

        for kernel in [
            KernelType::ThinPlateSpline,
            KernelType::InverseDistance,
            KernelType::PointMassGz,
        ] {
            let a = get_a_matrix(&targets, &sources, kernel);
            for i in 0..2 {
                for j in 0..2 {
                    assert!(kernel_value(targets.row(i), sources.row(j), kernel) == a[(i, j)]);
                }
            }
        }
    }

    #[test]
    fn neumaier_sum_recovers_cancelled_terms() {
        let mut sum = NeumaierSum::default();
        for _ in 0..1000 {
            sum.add(0.1);
        }
        assert!((sum.total() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn mean_and_std_of_known_values() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(mean(&values) == 5.0);
        assert!(std_dev(&values) == 2.0);
    }

    #[test]
    fn extents_of_empty_matrix_is_empty() {
        let points = Mat::<f64>::zeros(0, 2);
        assert!(get_pointarray_extents(&points).is_empty());
    }
}
