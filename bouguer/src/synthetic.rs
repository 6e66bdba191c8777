/////////////////////////////////////////////////////////////////////////////////////////////
//
// Generates synthetic gravity surveys with terrain, geoid and buried anomalies for testing.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Synthetic surveys for demonstrating and testing the pipeline.
//!
//! A survey bundles observations with topography and geoid rasters covering the
//! region plus a margin. Gravity is either a constant or modelled as normal
//! gravity at the station, plus the Bouguer plate of the local topography,
//! plus the attraction of an optional buried sphere and seeded Gaussian noise.

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use bouguer_utils::{DENSITY_CRUST, GRAVITATIONAL_CONST, MGAL_PER_MPS2};

use crate::ellipsoid::Ellipsoid;
use crate::error::Result;
use crate::normal_gravity::normal_gravity;
use crate::observations::ObservationTable;
use crate::projection::{Mercator, Projection};
use crate::raster::{CoordinateKind, Raster};
use crate::region::Region;
use crate::reproject::linspace;

/// Shape of the topography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terrain {
    /// Zero everywhere.
    Flat,

    /// `height · exp(-d² / (2 width²))`, with `d` the angular distance (degrees)
    /// from the peak. Negative heights give a basin below sea level.
    GaussianHill {
        longitude: f64,
        latitude: f64,
        height: f64,
        width: f64,
    },
}

impl Terrain {
    pub fn height(&self, lon: f64, lat: f64) -> f64 {
        match *self {
            Terrain::Flat => 0.0,
            Terrain::GaussianHill {
                longitude,
                latitude,
                height,
                width,
            } => {
                let d2 = (lon - longitude).powi(2) + (lat - latitude).powi(2);
                height * (-d2 / (2.0 * width * width)).exp()
            }
        }
    }
}

/// Homogeneous sphere buried below the survey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereAnomaly {
    pub longitude: f64,
    pub latitude: f64,
    /// Depth of the centre below the ellipsoid (m).
    pub depth: f64,
    pub radius: f64,
    /// Density contrast (kg/m³).
    pub density_contrast: f64,
}

/// Station placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StationLayout {
    /// `nx x ny` stations on a regular grid spanning the region.
    Grid { nx: usize, ny: usize },

    /// `count` stations drawn uniformly inside the region.
    Random { count: usize },
}

/// How the observed gravity values are produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurveyGravity {
    /// Every station reads the same value (mGal).
    Constant(f64),

    /// Normal gravity plus the Bouguer plate of the topography, an optional
    /// sphere and Gaussian noise with the given standard deviation (mGal).
    Modelled {
        anomaly: Option<SphereAnomaly>,
        noise_mgal: f64,
    },
}

/// Observations plus the rasters needed to process them.
#[derive(Debug, Clone)]
pub struct SyntheticSurvey {
    pub observations: ObservationTable,
    pub topography: Raster,
    pub geoid: Raster,
}

impl SyntheticSurvey {
    /// Returns a new [`SyntheticSurveyBuilder`] for `region` (degrees).
    pub fn builder(region: Region) -> SyntheticSurveyBuilder {
        SyntheticSurveyBuilder::new(region)
    }
}

/// A convenience builder for constructing a [`SyntheticSurvey`].
#[derive(Debug, Clone)]
pub struct SyntheticSurveyBuilder {
    region: Region,
    padding: f64,
    raster_spacing: f64,
    terrain: Terrain,
    geoid_height: f64,
    geoid_gradient: f64,
    layout: StationLayout,
    gravity: SurveyGravity,
    ellipsoid: Ellipsoid,
    seed: u64,
}

impl SyntheticSurveyBuilder {
    fn new(region: Region) -> Self {
        Self {
            region,
            padding: 1.0,
            raster_spacing: 0.1,
            terrain: Terrain::Flat,
            geoid_height: 0.0,
            geoid_gradient: 0.0,
            layout: StationLayout::Grid { nx: 5, ny: 5 },
            gravity: SurveyGravity::Modelled {
                anomaly: None,
                noise_mgal: 0.0,
            },
            ellipsoid: Ellipsoid::WGS84,
            seed: 42,
        }
    }

    /// Margin (degrees) of raster coverage around the region.
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Raster node spacing in degrees.
    pub fn raster_spacing(mut self, raster_spacing: f64) -> Self {
        self.raster_spacing = raster_spacing;
        self
    }

    pub fn terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = terrain;
        self
    }

    /// Geoid height `height + gradient · (lon - west)` in metres.
    pub fn geoid(mut self, height: f64, gradient_per_degree: f64) -> Self {
        self.geoid_height = height;
        self.geoid_gradient = gradient_per_degree;
        self
    }

    pub fn layout(mut self, layout: StationLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn gravity(mut self, gravity: SurveyGravity) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    /// Seed for station placement and noise.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn geoid_at(&self, lon: f64) -> f64 {
        self.geoid_height + self.geoid_gradient * (lon - self.region.west)
    }

    fn raster(&self, name: &str, padded: &Region, f: impl Fn(f64, f64) -> f64) -> Result<Raster> {
        let nx = (padded.width() / self.raster_spacing).round() as usize + 1;
        let ny = (padded.height() / self.raster_spacing).round() as usize + 1;
        let x = linspace(padded.west, padded.east, nx);
        let y = linspace(padded.south, padded.north, ny);
        let values = Mat::from_fn(ny, nx, |i, j| f(x[j], y[i]));
        Raster::new(name, CoordinateKind::Geographic, x, y, values)
    }

    /// Generates the survey.
    pub fn build(self) -> Result<SyntheticSurvey> {
        self.region.validate()?;
        let padded = self.region.pad(self.padding)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let (lon, lat): (Vec<f64>, Vec<f64>) = match self.layout {
            StationLayout::Grid { nx, ny } => {
                let xs = linspace(self.region.west, self.region.east, nx);
                let ys = linspace(self.region.south, self.region.north, ny);
                (0..nx * ny).map(|k| (xs[k % nx], ys[k / nx])).unzip()
            }
            StationLayout::Random { count } => (0..count)
                .map(|_| {
                    (
                        rng.random_range(self.region.west..self.region.east),
                        rng.random_range(self.region.south..self.region.north),
                    )
                })
                .unzip(),
        };

        let height = lon
            .iter()
            .zip(lat.iter())
            .map(|(&x, &y)| self.terrain.height(x, y))
            .collect::<Vec<_>>();

        let gravity = match self.gravity {
            SurveyGravity::Constant(value) => vec![value; lon.len()],
            SurveyGravity::Modelled { anomaly, noise_mgal } => {
                let centre = 0.5 * (self.region.south + self.region.north);
                let projection = Mercator::new(self.ellipsoid, centre)?;
                let slab = 2.0 * PI * GRAVITATIONAL_CONST * DENSITY_CRUST * MGAL_PER_MPS2;

                (0..lon.len())
                    .map(|i| {
                        let h_geometric = height[i] + self.geoid_at(lon[i]);
                        let mut g = normal_gravity(&self.ellipsoid, lat[i], h_geometric);
                        g += slab * height[i].max(0.0);
                        if let Some(sphere) = anomaly {
                            g += sphere_gz(&sphere, &projection, lon[i], lat[i], h_geometric);
                        }
                        if noise_mgal > 0.0 {
                            g += noise_mgal * standard_normal(&mut rng);
                        }
                        g
                    })
                    .collect()
            }
        };

        let observations = ObservationTable::new(lon, lat, height, gravity)?;
        let topography = self.raster("topography", &padded, |x, y| self.terrain.height(x, y))?;
        let geoid = self.raster("geoid", &padded, |x, _| self.geoid_at(x))?;

        Ok(SyntheticSurvey {
            observations,
            topography,
            geoid,
        })
    }
}

/// Downward attraction (mGal) of a sphere at a station.
fn sphere_gz(sphere: &SphereAnomaly, projection: &dyn Projection, lon: f64, lat: f64, upward: f64) -> f64 {
    let (e, n) = projection.forward(lon, lat);
    let (se, sn) = projection.forward(sphere.longitude, sphere.latitude);
    let dz = upward + sphere.depth;
    let r2 = (e - se).powi(2) + (n - sn).powi(2) + dz * dz;
    let mass = 4.0 / 3.0 * PI * sphere.radius.powi(3) * sphere.density_contrast;
    GRAVITATIONAL_CONST * mass * dz / (r2 * r2.sqrt()) * MGAL_PER_MPS2
}

/// Box-Muller standard normal sample.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::columns;

    fn region() -> Region {
        Region::new(25.0, 26.0, -24.0, -23.0).unwrap()
    }

    #[test]
    fn grid_layout_places_stations_on_region_edges() {
        let survey = SyntheticSurvey::builder(region())
            .layout(StationLayout::Grid { nx: 3, ny: 3 })
            .gravity(SurveyGravity::Constant(978_000.0))
            .build()
            .unwrap();

        let obs = &survey.observations;
        assert_eq!(obs.len(), 9);
        assert_eq!(obs.column(columns::LONGITUDE).unwrap()[2], 26.0);
        assert_eq!(obs.column(columns::LATITUDE).unwrap()[8], -23.0);
        assert!(obs.column(columns::GRAVITY).unwrap().iter().all(|g| *g == 978_000.0));
        assert!(obs.column(columns::HEIGHT_SEA_LEVEL).unwrap().iter().all(|h| *h == 0.0));
    }

    #[test]
    fn rasters_cover_the_padded_region() {
        let survey = SyntheticSurvey::builder(region())
            .padding(0.5)
            .raster_spacing(0.25)
            .geoid(20.0, 2.0)
            .build()
            .unwrap();

        assert_eq!(survey.topography.region(), region().pad(0.5).unwrap());
        assert_eq!(survey.topography.shape(), (9, 9));
        assert!(survey.geoid.same_grid(&survey.topography));
        // geoid = 20 + 2 (lon - 25)
        assert!((survey.geoid.values()[(0, 0)] - 19.0).abs() < 1e-12);
    }

    #[test]
    fn random_layout_is_seeded() {
        let build = |seed| {
            SyntheticSurvey::builder(region())
                .layout(StationLayout::Random { count: 20 })
                .seed(seed)
                .build()
                .unwrap()
                .observations
        };
        assert_eq!(build(1), build(1));
        assert_ne!(build(1), build(2));
        let table = build(3);
        assert!(table.column(columns::LONGITUDE).unwrap().iter().all(|x| (25.0..26.0).contains(x)));
    }

    #[test]
    fn hill_peaks_at_its_centre() {
        let hill = Terrain::GaussianHill {
            longitude: 25.5,
            latitude: -23.5,
            height: 1500.0,
            width: 0.2,
        };
        assert_eq!(hill.height(25.5, -23.5), 1500.0);
        assert!(hill.height(25.9, -23.5) < 300.0);
    }

    #[test]
    fn buried_sphere_raises_gravity_above_it() {
        let sphere = SphereAnomaly {
            longitude: 25.5,
            latitude: -23.5,
            depth: 5000.0,
            radius: 2000.0,
            density_contrast: 500.0,
        };
        let projection = Mercator::new(Ellipsoid::WGS84, -23.5).unwrap();
        let above = sphere_gz(&sphere, &projection, 25.5, -23.5, 0.0);
        let aside = sphere_gz(&sphere, &projection, 25.9, -23.5, 0.0);
        assert!(above > aside && aside > 0.0);
        // G M / d² for the station straight above.
        let mass = 4.0 / 3.0 * PI * 2000.0f64.powi(3) * 500.0;
        let expected = GRAVITATIONAL_CONST * mass / 5000.0f64.powi(2) * MGAL_PER_MPS2;
        assert!((above - expected).abs() < 1e-9 * expected);
    }
}
