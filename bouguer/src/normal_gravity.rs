/////////////////////////////////////////////////////////////////////////////////////////////
//
// Computes closed-form normal gravity of a rotating reference ellipsoid at any height.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # normal_gravity
//!
//! Magnitude of the gravity vector generated by a level ellipsoid, evaluated
//! at geodetic latitude and geometric (ellipsoidal) height without any
//! free-air approximation.
//!
//! The point is first expressed in ellipsoidal-harmonic coordinates: `b_l` is
//! the semi-minor axis of the confocal ellipsoid through the point and `β` its
//! reduced latitude.
//!
//! # References
//! 1. Li, X. and Götze, H. J., 2001. Ellipsoid, geoid, gravity, geodesy, and
//!    geophysics. Geophysics, 66(6), p.1660-1668.
//! 2. Hofmann-Wellenhof, B. and Moritz, H., 2006. Physical Geodesy. Springer.

use rayon::prelude::*;

use bouguer_utils::MGAL_PER_MPS2;

use crate::ellipsoid::Ellipsoid;
use crate::error::{PipelineError, Result};

/// Normal gravity in mGal at geodetic `latitude` (degrees) and geometric `height` (metres).
pub fn normal_gravity(ellipsoid: &Ellipsoid, latitude: f64, height: f64) -> f64 {
    let a = ellipsoid.semimajor_axis();
    let b = ellipsoid.semiminor_axis();
    let e2 = ellipsoid.first_eccentricity_sq();
    let big_e = ellipsoid.linear_eccentricity();
    let gm = ellipsoid.geocentric_grav_const();
    let omega = ellipsoid.angular_velocity();

    let (sin_lat, cos_lat) = latitude.to_radians().sin_cos();
    let n = ellipsoid.prime_vertical_radius(sin_lat);

    // Geodetic to rectangular (meridian plane).
    let big_r = (n + height) * cos_lat;
    let z = (n * (1.0 - e2) + height) * sin_lat;

    // Ellipsoidal-harmonic coordinates.
    let e_sq = big_e * big_e;
    let d = big_r * big_r + z * z - e_sq;
    let b_l_sq = 0.5 * (d + (d * d + 4.0 * e_sq * z * z).sqrt());
    let b_l = b_l_sq.sqrt();

    let tan_beta = z * (b_l_sq + e_sq).sqrt() / (b_l * big_r);
    let cos_beta_sq = 1.0 / (1.0 + tan_beta * tan_beta);
    let sin_beta_sq = 1.0 - cos_beta_sq;

    let q_0 = 0.5 * ((1.0 + 3.0 * (b / big_e).powi(2)) * (big_e / b).atan() - 3.0 * b / big_e);
    let q_l = 3.0 * (1.0 + b_l_sq / e_sq) * (1.0 - b_l / big_e * (big_e / b_l).atan()) - 1.0;

    let big_w = ((b_l_sq + e_sq * sin_beta_sq) / (b_l_sq + e_sq)).sqrt();

    let gamma = (gm / (b_l_sq + e_sq)
        + (0.5 * sin_beta_sq - 1.0 / 6.0) * a * a * big_e * q_l * omega * omega
            / ((b_l_sq + e_sq) * q_0)
        - cos_beta_sq * b_l * omega * omega)
        / big_w;

    gamma * MGAL_PER_MPS2
}

/// Normal gravity at many points, in the order given.
///
/// Latitudes must be within `[-90, 90]` and heights finite.
pub fn normal_gravity_many(ellipsoid: &Ellipsoid, latitude: &[f64], height: &[f64]) -> Result<Vec<f64>> {
    if latitude.len() != height.len() {
        return Err(PipelineError::InputShapeMismatch {
            context: "normal gravity inputs".into(),
            expected: (latitude.len(), 1),
            found: (height.len(), 1),
        });
    }
    if let Some(index) = latitude.iter().position(|lat| lat.is_nan() || lat.abs() > 90.0) {
        return Err(PipelineError::invalid(
            "latitude",
            latitude[index],
            format!("row {index} is outside [-90, 90]"),
        ));
    }
    crate::error::ensure_finite("normal gravity height", height.iter())?;

    Ok(latitude
        .par_iter()
        .zip(height.par_iter())
        .map(|(&lat, &h)| normal_gravity(ellipsoid, lat, h))
        .collect())
}
