/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds density models and prism layers from rasters and evaluates their vertical gravity.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # prism
//!
//! Forward modelling of the gravitational effect of the topography.
//!
//! The topography is discretised into right rectangular prisms, one per raster
//! node, each spanning vertically from the reference level to the surface.
//! The downward component of the attraction of each prism is evaluated with
//! the closed form solution
//!
//! ```text
//! g = Gρ Σ μ [ z atan(xy / (z r)) - x ln(y + r) - y ln(x + r) ]
//! ```
//!
//! where `x`, `y` are horizontal offsets from the station to the prism faces,
//! `z` the depths of the top and bottom faces below the station and
//! `μ = (-1)^(i + j + k)` selects the sign of each of the eight corners.
//!
//! # References
//! 1. Nagy, D., Papp, G. and Benedek, J., 2000. The gravitational potential and
//!    its derivatives for the prism. Journal of Geodesy, 74(7-8), p.552-560.
//! 2. Uieda, L. et al., 2020. Harmonica: Forward modeling, inversion, and
//!    processing gravity and magnetic data.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use bouguer_utils::{DENSITY_CRUST, DENSITY_WATER, GRAVITATIONAL_CONST, MGAL_PER_MPS2, NeumaierSum};

use crate::error::{PipelineError, Result};
use crate::raster::Raster;

/// Densities (kg/m³) used to turn topography into a density model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    /// Density of the crust above the ellipsoid. Missing crust below the
    /// ellipsoid is modelled with the negated value.
    pub crust: f64,

    /// Density of sea water.
    pub water: f64,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            crust: DENSITY_CRUST,
            water: DENSITY_WATER,
        }
    }
}

impl DensityParams {
    pub fn validate(&self) -> Result<()> {
        if !self.crust.is_finite() || self.crust <= 0.0 {
            return Err(PipelineError::invalid("density.crust", self.crust, "must be finite and positive"));
        }
        if !self.water.is_finite() || self.water < 0.0 {
            return Err(PipelineError::invalid("density.water", self.water, "must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Per-cell density on the grid of the topography.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityModel {
    density: Raster,
}

impl DensityModel {
    /// Crust density where the ellipsoidal topography is positive, negative crust
    /// density where it is not, and the water-crust contrast wherever the
    /// sea-level topography is below zero.
    pub fn from_topography(
        topography_geometric: &Raster,
        topography_sea_level: &Raster,
        params: &DensityParams,
    ) -> Result<Self> {
        params.validate()?;
        let density = topography_geometric.zip_map(topography_sea_level, "density", |geometric, sea_level| {
            if sea_level < 0.0 {
                params.water - params.crust
            } else if geometric > 0.0 {
                params.crust
            } else {
                -params.crust
            }
        })?;
        Ok(Self { density })
    }

    pub fn density(&self) -> &Raster {
        &self.density
    }
}

/// A right rectangular prism `[west, east] x [south, north] x [bottom, top]`
/// with uniform density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prism {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
    pub bottom: f64,
    pub top: f64,
    pub density: f64,
}

impl Prism {
    /// True for prisms that contribute nothing (zero thickness or non-finite).
    #[inline]
    fn is_void(&self) -> bool {
        let bounds = [self.west, self.east, self.south, self.north, self.bottom, self.top, self.density];
        bounds.iter().any(|v| !v.is_finite()) || self.top == self.bottom || self.density == 0.0
    }

    /// Downward gravitational acceleration (mGal) at `(easting, northing, upward)`.
    pub fn gravity_z(&self, easting: f64, northing: f64, upward: f64) -> f64 {
        if self.is_void() {
            return 0.0;
        }

        let xs = [self.west - easting, self.east - easting];
        let ys = [self.south - northing, self.north - northing];
        // Depths below the station, shallow face first.
        let zs = [upward - self.top, upward - self.bottom];

        let mut sum = NeumaierSum::default();
        for (i, &x) in xs.iter().enumerate() {
            for (j, &y) in ys.iter().enumerate() {
                for (k, &z) in zs.iter().enumerate() {
                    let sign = if (i + j + k) % 2 == 0 { -1.0 } else { 1.0 };
                    sum.add(sign * kernel_gz(x, y, z));
                }
            }
        }

        GRAVITATIONAL_CONST * self.density * sum.total() * MGAL_PER_MPS2
    }
}

/// `ln(a + r)` with the cancellation for negative `a` removed.
///
/// `bc_sq` is the sum of the squares of the other two offsets.
#[inline(always)]
fn stable_log(a: f64, r: f64, bc_sq: f64) -> f64 {
    if a >= 0.0 {
        (a + r).ln()
    } else {
        (bc_sq / (r - a)).ln()
    }
}

/// Corner term `z atan(xy / (z r)) - x ln(y + r) - y ln(x + r)` with its
/// singular pieces replaced by their limits.
#[inline(always)]
fn kernel_gz(x: f64, y: f64, z: f64) -> f64 {
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let r = (x2 + y2 + z2).sqrt();

    let atan_term = if z == 0.0 { 0.0 } else { z * (x * y / (z * r)).atan() };
    let x_term = if x == 0.0 { 0.0 } else { x * stable_log(y, r, x2 + z2) };
    let y_term = if y == 0.0 { 0.0 } else { y * stable_log(x, r, y2 + z2) };

    atan_term - x_term - y_term
}

/// Prisms discretising a surface between a reference level and the surface value.
#[derive(Debug, Clone, Default)]
pub struct PrismLayer {
    prisms: Vec<Prism>,
}

impl PrismLayer {
    /// One prism per node of `surface`, centred on the node with the grid
    /// spacing as its horizontal size. Bottom and top are the minimum and
    /// maximum of the surface value and `reference`.
    pub fn from_raster(surface: &Raster, reference: f64, density: &DensityModel) -> Result<Self> {
        let density = density.density();
        if !surface.same_grid(density) {
            return Err(PipelineError::InputShapeMismatch {
                context: "prism layer surface and density grids".into(),
                expected: surface.shape(),
                found: density.shape(),
            });
        }

        let (ny, nx) = surface.shape();
        let (dx, dy) = surface.spacing();
        if dx <= 0.0 || dy <= 0.0 {
            return Err(PipelineError::InputShapeMismatch {
                context: "prism layer needs at least 2 x 2 nodes".into(),
                expected: (2, 2),
                found: (ny, nx),
            });
        }

        let (x, y) = (surface.x(), surface.y());
        let values = surface.values();
        let rho = density.values();

        let mut prisms = Vec::with_capacity(nx * ny);
        for i in 0..ny {
            for j in 0..nx {
                let s = values[(i, j)];
                prisms.push(Prism {
                    west: x[j] - 0.5 * dx,
                    east: x[j] + 0.5 * dx,
                    south: y[i] - 0.5 * dy,
                    north: y[i] + 0.5 * dy,
                    bottom: s.min(reference),
                    top: s.max(reference),
                    density: rho[(i, j)],
                });
            }
        }

        Ok(Self { prisms })
    }

    /// Wraps an explicit list of prisms.
    pub fn from_prisms(prisms: Vec<Prism>) -> Self {
        Self { prisms }
    }

    pub fn prisms(&self) -> &[Prism] {
        &self.prisms
    }

    pub fn len(&self) -> usize {
        self.prisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prisms.is_empty()
    }

    /// Downward gravity (mGal) of the whole layer at each station.
    ///
    /// Stations are processed in parallel; the sum over prisms for one station
    /// is sequential, so results do not depend on the thread count.
    pub fn gravity_z(&self, easting: &[f64], northing: &[f64], upward: &[f64]) -> Result<Vec<f64>> {
        if easting.len() != northing.len() || easting.len() != upward.len() {
            return Err(PipelineError::InputShapeMismatch {
                context: "prism layer stations".into(),
                expected: (easting.len(), 3),
                found: (northing.len().min(upward.len()), 3),
            });
        }

        Ok((0..easting.len())
            .into_par_iter()
            .map(|p| {
                let mut sum = NeumaierSum::default();
                for prism in &self.prisms {
                    sum.add(prism.gravity_z(easting[p], northing[p], upward[p]));
                }
                sum.total()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::CoordinateKind;
    use faer::Mat;
    use std::f64::consts::PI;

    /// Gauss-Legendre nodes and weights on [-1, 1] by Newton iteration.
    fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        for i in 0..n {
            let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            let mut dp = 0.0;
            for _ in 0..100 {
                let (mut p0, mut p1) = (1.0, x);
                for k in 2..=n {
                    let p2 = ((2 * k - 1) as f64 * x * p1 - (k - 1) as f64 * p0) / k as f64;
                    p0 = p1;
                    p1 = p2;
                }
                dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
                let dx = p1 / dp;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            nodes[i] = x;
            weights[i] = 2.0 / ((1.0 - x * x) * dp * dp);
        }
        (nodes, weights)
    }

    fn quadrature_gz(prism: &Prism, e: f64, n: f64, u: f64, order: usize) -> f64 {
        let (t, w) = gauss_legendre(order);
        let map = |lo: f64, hi: f64, s: f64| 0.5 * (hi - lo) * s + 0.5 * (hi + lo);
        let jac = 0.125
            * (prism.east - prism.west)
            * (prism.north - prism.south)
            * (prism.top - prism.bottom);
        let mut sum = 0.0;
        for a in 0..order {
            for b in 0..order {
                for c in 0..order {
                    let x = map(prism.west, prism.east, t[a]) - e;
                    let y = map(prism.south, prism.north, t[b]) - n;
                    let z = u - map(prism.bottom, prism.top, t[c]);
                    let r = (x * x + y * y + z * z).sqrt();
                    sum += w[a] * w[b] * w[c] * z / (r * r * r);
                }
            }
        }
        GRAVITATIONAL_CONST * prism.density * jac * sum * MGAL_PER_MPS2
    }

    fn unit_prism(density: f64) -> Prism {
        Prism {
            west: -500.0,
            east: 500.0,
            south: -300.0,
            north: 700.0,
            bottom: -800.0,
            top: 0.0,
            density,
        }
    }

    #[test]
    fn matches_quadrature_above_the_prism() {
        let prism = unit_prism(2670.0);
        let closed = prism.gravity_z(0.0, 100.0, 1000.0);
        let numeric = quadrature_gz(&prism, 0.0, 100.0, 1000.0, 24);
        assert!(closed > 0.0);
        assert!(((closed - numeric) / numeric).abs() < 1e-6, "{closed} vs {numeric}");
    }

    #[test]
    fn matches_quadrature_beside_the_prism() {
        let prism = unit_prism(-1630.0);
        let closed = prism.gravity_z(2000.0, -1500.0, -100.0);
        let numeric = quadrature_gz(&prism, 2000.0, -1500.0, -100.0, 24);
        // above the mid-depth the buried ocean contrast pulls downward
        assert!(closed < 0.0);
        assert!(((closed - numeric) / numeric).abs() < 1e-6, "{closed} vs {numeric}");
    }

    #[test]
    fn approaches_point_mass_far_away() {
        let prism = unit_prism(2670.0);
        let (e, n, u): (f64, f64, f64) = (60_000.0, -80_000.0, 100_000.0);
        let mass = 1000.0 * 1000.0 * 800.0 * 2670.0;
        let (cx, cy, cz): (f64, f64, f64) = (0.0, 200.0, -400.0);
        let (dx, dy, dz) = (cx - e, cy - n, u - cz);
        let r = (dx * dx + dy * dy + dz * dz).sqrt();
        let point_mass = GRAVITATIONAL_CONST * mass * dz / r.powi(3) * MGAL_PER_MPS2;

        let closed = prism.gravity_z(e, n, u);
        assert!(((closed - point_mass) / point_mass).abs() < 1e-4);
    }

    #[test]
    fn approaches_bouguer_slab_for_wide_thin_prism() {
        let thickness = 100.0;
        let prism = Prism {
            west: -5e5,
            east: 5e5,
            south: -5e5,
            north: 5e5,
            bottom: -thickness,
            top: 0.0,
            density: 2670.0,
        };
        let slab = 2.0 * PI * GRAVITATIONAL_CONST * 2670.0 * thickness * MGAL_PER_MPS2;
        let closed = prism.gravity_z(0.0, 0.0, 10.0);
        assert!(((closed - slab) / slab).abs() < 1e-3, "{closed} vs {slab}");
    }

    #[test]
    fn mass_above_pulls_upward() {
        let prism = unit_prism(2670.0);
        assert!(prism.gravity_z(0.0, 100.0, -2000.0) < 0.0);
    }

    #[test]
    fn station_on_a_corner_is_finite() {
        let prism = unit_prism(2670.0);
        let g = prism.gravity_z(500.0, 700.0, 0.0);
        assert!(g.is_finite() && g > 0.0);
    }

    #[test]
    fn zero_thickness_and_nan_prisms_contribute_nothing() {
        let mut flat = unit_prism(2670.0);
        flat.bottom = 0.0;
        assert_eq!(flat.gravity_z(0.0, 0.0, 10.0), 0.0);

        let mut broken = unit_prism(2670.0);
        broken.top = f64::NAN;
        assert_eq!(broken.gravity_z(0.0, 0.0, 10.0), 0.0);
    }

    fn surface() -> (Raster, Raster) {
        let x = vec![0.0, 1000.0, 2000.0];
        let y = vec![0.0, 1000.0];
        let topo = Mat::from_fn(2, 3, |i, j| [[300.0, -50.0, 0.0], [120.0, 10.0, -200.0]][i][j]);
        let geom = Mat::from_fn(2, 3, |i, j| [[320.0, -30.0, 20.0], [140.0, -5.0, -180.0]][i][j]);
        (
            Raster::new("topo_geom", CoordinateKind::Projected, x.clone(), y.clone(), geom).unwrap(),
            Raster::new("topo", CoordinateKind::Projected, x, y, topo).unwrap(),
        )
    }

    #[test]
    fn density_follows_land_and_ocean_rules() {
        let (geom, topo) = surface();
        let model = DensityModel::from_topography(&geom, &topo, &DensityParams::default()).unwrap();
        let rho = model.density().values();
        assert_eq!(rho[(0, 0)], 2670.0);
        assert_eq!(rho[(0, 1)], 1040.0 - 2670.0);
        assert_eq!(rho[(0, 2)], 2670.0);
        assert_eq!(rho[(1, 1)], -2670.0);
        assert_eq!(rho[(1, 2)], 1040.0 - 2670.0);
    }

    #[test]
    fn layer_prisms_are_centred_on_nodes() {
        let (geom, topo) = surface();
        let model = DensityModel::from_topography(&geom, &topo, &DensityParams::default()).unwrap();
        let layer = PrismLayer::from_raster(&geom, 0.0, &model).unwrap();
        assert_eq!(layer.len(), 6);

        let p = layer.prisms()[1];
        assert_eq!((p.west, p.east, p.south, p.north), (500.0, 1500.0, -500.0, 500.0));
        assert_eq!((p.bottom, p.top), (-30.0, 0.0));

        let p = layer.prisms()[3];
        assert_eq!((p.bottom, p.top), (0.0, 140.0));
    }

    #[test]
    fn doubling_density_doubles_the_effect() {
        let (geom, topo) = surface();
        let single = DensityParams { crust: 2670.0, water: 1040.0 };
        let double = DensityParams { crust: 5340.0, water: 2080.0 };

        let layer = |params: &DensityParams| {
            let model = DensityModel::from_topography(&geom, &topo, params).unwrap();
            PrismLayer::from_raster(&geom, 0.0, &model).unwrap()
        };

        let g1 = layer(&single).gravity_z(&[800.0], &[400.0], &[500.0]).unwrap()[0];
        let g2 = layer(&double).gravity_z(&[800.0], &[400.0], &[500.0]).unwrap()[0];
        assert!((g2 - 2.0 * g1).abs() <= 1e-12 * g1.abs().max(1e-12));
    }

    #[test]
    fn flat_surface_has_no_effect() {
        let x = vec![0.0, 1000.0, 2000.0];
        let y = vec![0.0, 1000.0, 2000.0];
        let zero = Raster::new("flat", CoordinateKind::Projected, x, y, Mat::zeros(3, 3)).unwrap();
        let model = DensityModel::from_topography(&zero, &zero, &DensityParams::default()).unwrap();
        let layer = PrismLayer::from_raster(&zero, 0.0, &model).unwrap();
        let g = layer.gravity_z(&[1000.0, 0.0], &[1000.0, 2000.0], &[0.0, 50.0]).unwrap();
        assert_eq!(g, vec![0.0, 0.0]);
    }
}
