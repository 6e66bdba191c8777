/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines geographic regions of interest, padding, and point-in-region tests.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PipelineError, Result};

/// Edge convention used when testing whether a coordinate lies inside a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Boundary {
    /// `west <= x <= east` and `south <= y <= north`.
    #[default]
    Inclusive,

    /// `west <= x < east` and `south <= y < north`.
    HalfOpen,
}

/// Axis aligned bounding box `(west, east, south, north)`.
///
/// Units are whatever the coordinates are in: degrees for geographic data,
/// metres once projected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Region {
    /// Creates a region, rejecting degenerate or non-finite bounds.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self> {
        let region = Self { west, east, south, north };
        region.validate()?;
        Ok(region)
    }

    /// Checks that the bounds are finite and `west < east`, `south < north`.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.west, self.east, self.south, self.north];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::invalid(
                "region",
                self,
                "bounds must be finite",
            ));
        }
        if self.west >= self.east {
            return Err(PipelineError::invalid("region", self, "west must be less than east"));
        }
        if self.south >= self.north {
            return Err(PipelineError::invalid("region", self, "south must be less than north"));
        }
        Ok(())
    }

    /// Returns the region grown by `pad` on every side.
    pub fn pad(&self, pad: f64) -> Result<Self> {
        if !pad.is_finite() || pad < 0.0 {
            return Err(PipelineError::invalid(
                "padding",
                pad,
                "must be finite and non-negative",
            ));
        }
        Ok(Self {
            west: self.west - pad,
            east: self.east + pad,
            south: self.south - pad,
            north: self.north + pad,
        })
    }

    /// Tests a single coordinate against the region.
    #[inline]
    pub fn contains(&self, x: f64, y: f64, boundary: Boundary) -> bool {
        match boundary {
            Boundary::Inclusive => {
                self.west <= x && x <= self.east && self.south <= y && y <= self.north
            }
            Boundary::HalfOpen => {
                self.west <= x && x < self.east && self.south <= y && y < self.north
            }
        }
    }

    /// Indices (in input order) of the coordinates inside the region.
    pub fn inside_indices(&self, x: &[f64], y: &[f64], boundary: Boundary) -> Vec<usize> {
        x.iter()
            .zip(y.iter())
            .enumerate()
            .filter(|(_, (xi, yi))| self.contains(**xi, **yi, boundary))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Smallest region enclosing every `(x, y)` pair. `None` for empty input.
    pub fn bounding(x: &[f64], y: &[f64]) -> Option<Self> {
        if x.is_empty() || y.is_empty() {
            return None;
        }
        let fold = |v: &[f64]| {
            v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                (lo.min(c), hi.max(c))
            })
        };
        let (west, east) = fold(x);
        let (south, north) = fold(y);
        Some(Self { west, east, south, north })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[W {}, E {}, S {}, N {}]",
            self.west, self.east, self.south, self.north
        )
    }
}

impl Default for Region {
    fn default() -> Self {
        Self {
            west: 25.0,
            east: 32.0,
            south: -27.0,
            north: -23.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_extends_every_side() {
        let region = Region::new(25.0, 32.0, -27.0, -23.0).unwrap();
        let padded = region.pad(5.0).unwrap();
        assert_eq!(padded, Region { west: 20.0, east: 37.0, south: -32.0, north: -18.0 });
    }

    #[test]
    fn negative_padding_is_rejected() {
        let region = Region::default();
        assert!(matches!(
            region.pad(-1.0),
            Err(PipelineError::InvalidParameter { name: "padding", .. })
        ));
    }

    #[test]
    fn degenerate_region_is_rejected() {
        assert!(Region::new(1.0, 1.0, 0.0, 1.0).is_err());
        assert!(Region::new(0.0, 1.0, 2.0, 1.0).is_err());
        assert!(Region::new(0.0, f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn inclusive_boundary_keeps_edges() {
        let region = Region::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let x = [0.0, 1.0, 0.5, 1.0, 1.5];
        let y = [0.0, 1.0, 0.5, 0.5, 0.5];
        assert_eq!(region.inside_indices(&x, &y, Boundary::Inclusive), vec![0, 1, 2, 3]);
    }

    #[test]
    fn half_open_boundary_drops_east_and_north_edges() {
        let region = Region::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let x = [0.0, 1.0, 0.5, 1.0, 0.5];
        let y = [0.0, 1.0, 0.5, 0.5, 1.0];
        assert_eq!(region.inside_indices(&x, &y, Boundary::HalfOpen), vec![0, 2]);
    }

    #[test]
    fn bounding_region_of_points() {
        let region = Region::bounding(&[3.0, -1.0, 2.0], &[0.5, 4.0, -2.0]).unwrap();
        assert_eq!(region, Region { west: -1.0, east: 3.0, south: -2.0, north: 4.0 });
        assert!(Region::bounding(&[], &[]).is_none());
    }
}
