/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines physical constants shared by the gravity kernels and the terrain correction.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Newtonian gravitational constant in m³ kg⁻¹ s⁻² (CODATA 2018).
pub const GRAVITATIONAL_CONST: f64 = 6.6743e-11;

/// Conversion factor from m/s² to mGal.
pub const MGAL_PER_MPS2: f64 = 1e5;

/// Typical density of upper crustal rock in kg/m³.
pub const DENSITY_CRUST: f64 = 2670.0;

/// Density of sea water in kg/m³.
pub const DENSITY_WATER: f64 = 1040.0;
