/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the reference ellipsoids used for projection and normal gravity.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// Rotating reference ellipsoids with their defining constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Ellipsoid {
    #[default]
    WGS84,
    GRS80,
}

impl Ellipsoid {
    /// Semi-major axis `a` in metres.
    pub fn semimajor_axis(&self) -> f64 {
        6_378_137.0
    }

    /// Flattening `f`.
    pub fn flattening(&self) -> f64 {
        match self {
            Ellipsoid::WGS84 => 1.0 / 298.257_223_563,
            Ellipsoid::GRS80 => 1.0 / 298.257_222_101,
        }
    }

    /// Geocentric gravitational constant `GM` in m³/s².
    pub fn geocentric_grav_const(&self) -> f64 {
        match self {
            Ellipsoid::WGS84 => 3.986_004_418e14,
            Ellipsoid::GRS80 => 3.986_005e14,
        }
    }

    /// Angular velocity `ω` in rad/s.
    pub fn angular_velocity(&self) -> f64 {
        7.292_115e-5
    }

    /// Semi-minor axis `b = a (1 - f)`.
    pub fn semiminor_axis(&self) -> f64 {
        self.semimajor_axis() * (1.0 - self.flattening())
    }

    /// First eccentricity squared `e² = f (2 - f)`.
    pub fn first_eccentricity_sq(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    pub fn first_eccentricity(&self) -> f64 {
        self.first_eccentricity_sq().sqrt()
    }

    /// Linear eccentricity `E = sqrt(a² - b²)`.
    pub fn linear_eccentricity(&self) -> f64 {
        let a = self.semimajor_axis();
        let b = self.semiminor_axis();
        (a * a - b * b).sqrt()
    }

    /// Prime vertical radius of curvature, given the sine of the geodetic latitude.
    pub fn prime_vertical_radius(&self, sin_lat: f64) -> f64 {
        self.semimajor_axis() / (1.0 - self.first_eccentricity_sq() * sin_lat * sin_lat).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_derived_constants() {
        let e = Ellipsoid::WGS84;
        assert!((e.semiminor_axis() - 6_356_752.314_245).abs() < 1e-3);
        assert!((e.first_eccentricity_sq() - 0.006_694_379_990_14).abs() < 1e-13);
        assert!((e.linear_eccentricity() - 521_854.008_4).abs() < 1e-3);
    }

    #[test]
    fn grs80_differs_only_slightly() {
        let diff = Ellipsoid::GRS80.semiminor_axis() - Ellipsoid::WGS84.semiminor_axis();
        assert!(diff.abs() < 1e-3);
        assert!(diff != 0.0);
    }
}
