/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the kernel evaluation trait used for dense kernel matrix assembly.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::RowRef;

/// Evaluates a kernel function between a target and source point.
///
/// Implementors define how the kernel is computed given two
/// [`faer::RowRef<f64>`](https://docs.rs/faer/latest/faer/row/type.RowRef.html)
/// arguments representing the target and source locations. Planar kernels read
/// `(easting, northing)`, potential-field kernels read `(easting, northing, upward)`.
pub trait KernelFunction: Sync {
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64;
}
