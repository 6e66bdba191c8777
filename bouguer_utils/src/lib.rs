/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel functions, physical constants, and matrix helpers used across the bouguer crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`bouguer`] crate
//!
//! Holds the pieces of the gravity processing workflow that are independent of
//! the pipeline itself: physical constants, the [`KernelFunction`] trait and
//! its implementations, dense kernel matrix assembly and a few small numeric
//! helpers.
mod constants;
mod kernels;
mod traits;
mod utils;

/// Kernel functions available for dense kernel matrix assembly.
pub mod kernel_functions {
    pub use super::kernels::*;
}

pub use {
    constants::{
        DENSITY_CRUST, DENSITY_WATER, GRAVITATIONAL_CONST, MGAL_PER_MPS2,
    },
    traits::KernelFunction,
    utils::{
        KernelType, NeumaierSum, get_a_matrix, get_a_matrix_symmetric, get_a_matrix_typed,
        get_distance, get_distance_sq, get_pointarray_extents, kernel_value, mean, select_mat_rows,
        std_dev,
    },
};
