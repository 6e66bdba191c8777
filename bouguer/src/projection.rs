/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the ellipsoidal Mercator projection used to map observations and rasters.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # projection
//!
//! Map projections from geodetic longitude/latitude (degrees) to planar
//! easting/northing (metres).
//!
//! # References
//! 1. Snyder, J. P., 1987. Map Projections: A Working Manual. USGS Professional Paper 1395.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

use crate::ellipsoid::Ellipsoid;
use crate::error::{PipelineError, Result};

const INVERSE_TOL: f64 = 1e-14;
const INVERSE_MAX_ITER: usize = 32;

/// Forward and inverse mapping between geographic and planar coordinates.
pub trait Projection: Send + Sync {
    /// `(longitude, latitude)` in degrees to `(easting, northing)` in metres.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);

    /// `(easting, northing)` in metres to `(longitude, latitude)` in degrees.
    fn inverse(&self, easting: f64, northing: f64) -> (f64, f64);

    /// Projects paired coordinate slices.
    fn forward_many(&self, lon: &[f64], lat: &[f64]) -> (Vec<f64>, Vec<f64>) {
        lon.iter().zip(lat.iter()).map(|(&x, &y)| self.forward(x, y)).unzip()
    }

    /// Inverse-projects paired coordinate slices.
    fn inverse_many(&self, easting: &[f64], northing: &[f64]) -> (Vec<f64>, Vec<f64>) {
        easting
            .iter()
            .zip(northing.iter())
            .map(|(&x, &y)| self.inverse(x, y))
            .unzip()
    }
}

/// Ellipsoidal Mercator with a chosen latitude of true scale.
///
/// Central meridian 0°, no false easting or northing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    lat_ts: f64,
    k0: f64,
}

impl Mercator {
    /// Creates a Mercator projection with true scale at `lat_ts` degrees.
    pub fn new(ellipsoid: Ellipsoid, lat_ts: f64) -> Result<Self> {
        if !lat_ts.is_finite() || lat_ts.abs() >= 90.0 {
            return Err(PipelineError::invalid(
                "latitude of true scale",
                lat_ts,
                "must lie strictly between -90 and 90 degrees",
            ));
        }
        let e2 = ellipsoid.first_eccentricity_sq();
        let phi = lat_ts.to_radians();
        let k0 = phi.cos() / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        Ok(Self { ellipsoid, lat_ts, k0 })
    }

    /// Latitude of true scale in degrees.
    pub fn lat_ts(&self) -> f64 {
        self.lat_ts
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    /// Scale factor on the central meridian at the equator.
    pub fn scale_factor(&self) -> f64 {
        self.k0
    }
}

impl Projection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let a = self.ellipsoid.semimajor_axis();
        let e = self.ellipsoid.first_eccentricity();
        let lam = lon.to_radians();
        let phi = lat.to_radians();
        let esin = e * phi.sin();

        let x = a * self.k0 * lam;
        let y = a
            * self.k0
            * ((FRAC_PI_4 + 0.5 * phi).tan() * ((1.0 - esin) / (1.0 + esin)).powf(0.5 * e)).ln();
        (x, y)
    }

    fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let a = self.ellipsoid.semimajor_axis();
        let e = self.ellipsoid.first_eccentricity();
        let ak0 = a * self.k0;

        let t = (-northing / ak0).exp();
        let mut phi = FRAC_PI_2 - 2.0 * t.atan();

        for _ in 0..INVERSE_MAX_ITER {
            let esin = e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - esin) / (1.0 + esin)).powf(0.5 * e)).atan();
            let delta = (next - phi).abs();
            phi = next;
            if delta < INVERSE_TOL {
                break;
            }
        }

        ((easting / ak0).to_degrees(), phi.to_degrees())
    }
}
