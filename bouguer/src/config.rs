/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the pipeline configuration, its builder, validation and JSON persistence.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares the pipeline configuration, its builder, validation and JSON persistence.
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::ellipsoid::Ellipsoid;
use crate::error::{PipelineError, Result};
use crate::gridders::GeoidInterpolation;
use crate::prism::DensityParams;
use crate::region::{Boundary, Region};
use crate::source_config::EquivalentSourceSettings;

const JSON_FORMAT_NAME: &str = "bouguer.config.json";
const JSON_VERSION: u32 = 1;

#[doc = include_str!("../docs/pipeline_config.md")]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Region of interest in degrees.
    pub region: Region,

    /// Margin (degrees) added around `region` when cropping rasters.
    pub padding: f64,

    /// Edge convention when cropping observations.
    pub boundary: Boundary,

    /// Deep sources approximating the regional field.
    pub regional: EquivalentSourceSettings,

    /// Shallow sources used to grid the residual field.
    pub residual: EquivalentSourceSettings,

    /// Output grid spacing in degrees.
    pub grid_spacing_deg: f64,

    /// Height (m, above the ellipsoid) of the output grid.
    pub grid_height_m: f64,

    /// Densities used for the terrain model.
    pub density: DensityParams,

    /// Reference ellipsoid for projection and normal gravity.
    pub ellipsoid: Ellipsoid,

    /// Interpolator used for geoid heights at the observations.
    pub geoid_interpolation: GeoidInterpolation,

    /// Block-average raster samples before nearest neighbour reprojection.
    pub antialias: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::builder().build()
    }
}

impl PipelineConfig {
    /// Returns a new [`PipelineConfigBuilder`] with the default values.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Checks every parameter, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        if self.region.south < -90.0 || self.region.north > 90.0 {
            return Err(PipelineError::invalid("region", self.region, "latitudes must lie within [-90, 90]"));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(PipelineError::invalid("padding", self.padding, "must be finite and non-negative"));
        }
        self.regional.validate()?;
        self.residual.validate()?;
        if !self.grid_spacing_deg.is_finite() || self.grid_spacing_deg <= 0.0 {
            return Err(PipelineError::invalid(
                "grid_spacing_deg",
                self.grid_spacing_deg,
                "must be finite and positive",
            ));
        }
        if !self.grid_height_m.is_finite() {
            return Err(PipelineError::invalid("grid_height_m", self.grid_height_m, "must be finite"));
        }
        self.density.validate()?;
        Ok(())
    }

    /// Save this configuration to a **JSON envelope** `{ format, version, config }`.
    ///
    /// ### Errors
    /// - Returns `PipelineError::{Create, Serialize}` on I/O or serialization failures.
    ///
    /// ### Example
    /// ```no_run
    /// # use bouguer::PipelineConfig;
    /// PipelineConfig::default().save("pipeline.json")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref).map_err(|e| PipelineError::Create {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);

        let env = JsonEnvelopeRef {
            format: JSON_FORMAT_NAME,
            version: JSON_VERSION,
            config: self,
        };

        serde_json::to_writer_pretty(&mut w, &env).map_err(|e| PipelineError::Serialize {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        w.flush().map_err(|e| PipelineError::Create {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Load a configuration from a versioned **JSON envelope**, validating format,
    /// version and parameter values.
    ///
    /// ### Errors
    /// - Returns `PipelineError::{Open, Parse, FormatMismatch, VersionMismatch}` as appropriate,
    ///   or the validation error of the loaded values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let file = File::open(path_ref).map_err(|e| PipelineError::Open {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let env: JsonEnvelopeOwned<Self> =
            serde_json::from_reader(reader).map_err(|e| PipelineError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            })?;

        if env.format != JSON_FORMAT_NAME {
            return Err(PipelineError::FormatMismatch {
                path: path_ref.to_path_buf(),
                found: env.format,
                expected: JSON_FORMAT_NAME,
            });
        }

        if env.version != JSON_VERSION {
            return Err(PipelineError::VersionMismatch {
                path: path_ref.to_path_buf(),
                found: env.version,
                expected: JSON_VERSION,
            });
        }

        env.config.validate()?;
        Ok(env.config)
    }
}

/// Borrowing envelope for SAVE.
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    config: &'a T,
}

/// Owning envelope for LOAD.
#[derive(Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    config: T,
}

/// A convenience builder for constructing a [`PipelineConfig`] instance.
///
/// The builder should be called via the [`PipelineConfig::builder`] method.
///
/// See [`PipelineConfig`] for details on each field.
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    region: Region,
    padding: f64,
    boundary: Boundary,
    regional: EquivalentSourceSettings,
    residual: EquivalentSourceSettings,
    grid_spacing_deg: f64,
    grid_height_m: f64,
    density: DensityParams,
    ellipsoid: Ellipsoid,
    geoid_interpolation: GeoidInterpolation,
    antialias: bool,
}

impl PipelineConfigBuilder {
    fn new() -> Self {
        Self {
            region: Region::default(),
            padding: 5.0,
            boundary: Boundary::Inclusive,
            regional: EquivalentSourceSettings::builder()
                .damping(1000.0)
                .depth(500e3)
                .build(),
            residual: EquivalentSourceSettings::builder()
                .damping(10.0)
                .depth(10e3)
                .build(),
            grid_spacing_deg: 2.0 / 60.0,
            grid_height_m: 2200.0,
            density: DensityParams::default(),
            ellipsoid: Ellipsoid::WGS84,
            geoid_interpolation: GeoidInterpolation::Spline,
            antialias: true,
        }
    }

    /// Sets the region of interest.
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Sets the raster cropping margin in degrees.
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the edge convention for cropping observations.
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Sets the regional equivalent-source settings.
    pub fn regional(mut self, regional: EquivalentSourceSettings) -> Self {
        self.regional = regional;
        self
    }

    /// Sets the residual equivalent-source settings.
    pub fn residual(mut self, residual: EquivalentSourceSettings) -> Self {
        self.residual = residual;
        self
    }

    /// Sets the output grid spacing in degrees.
    pub fn grid_spacing_deg(mut self, grid_spacing_deg: f64) -> Self {
        self.grid_spacing_deg = grid_spacing_deg;
        self
    }

    /// Sets the output grid height in metres.
    pub fn grid_height_m(mut self, grid_height_m: f64) -> Self {
        self.grid_height_m = grid_height_m;
        self
    }

    /// Sets the terrain densities.
    pub fn density(mut self, density: DensityParams) -> Self {
        self.density = density;
        self
    }

    /// Sets the reference ellipsoid.
    pub fn ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    /// Sets the geoid interpolator.
    pub fn geoid_interpolation(mut self, geoid_interpolation: GeoidInterpolation) -> Self {
        self.geoid_interpolation = geoid_interpolation;
        self
    }

    /// Enables or disables antialiasing during raster reprojection.
    pub fn antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    /// Builds and returns a [`PipelineConfig`] instance.
    pub fn build(self) -> PipelineConfig {
        PipelineConfig {
            region: self.region,
            padding: self.padding,
            boundary: self.boundary,
            regional: self.regional,
            residual: self.residual,
            grid_spacing_deg: self.grid_spacing_deg,
            grid_height_m: self.grid_height_m,
            density: self.density,
            ellipsoid: self.ellipsoid,
            geoid_interpolation: self.geoid_interpolation,
            antialias: self.antialias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bouguer_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn defaults_match_processing_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.region, Region { west: 25.0, east: 32.0, south: -27.0, north: -23.0 });
        assert_eq!(config.padding, 5.0);
        assert_eq!(config.regional.damping, 1000.0);
        assert_eq!(config.regional.depth, 500e3);
        assert_eq!(config.residual.damping, 10.0);
        assert_eq!(config.residual.depth, 10e3);
        assert_eq!(config.grid_spacing_deg, 2.0 / 60.0);
        assert_eq!(config.grid_height_m, 2200.0);
        assert!(config.antialias);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad = [
            PipelineConfig::builder().padding(-1.0).build(),
            PipelineConfig::builder().grid_spacing_deg(0.0).build(),
            PipelineConfig::builder().grid_height_m(f64::INFINITY).build(),
            PipelineConfig::builder()
                .region(Region { west: 1.0, east: 0.0, south: 0.0, north: 1.0 })
                .build(),
            PipelineConfig::builder()
                .residual(EquivalentSourceSettings::builder().depth(-5.0).build())
                .build(),
            PipelineConfig::builder()
                .density(DensityParams { crust: 0.0, water: 1040.0 })
                .build(),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(PipelineError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn json_round_trip() {
        let path = temp_path("round_trip");
        let config = PipelineConfig::builder()
            .padding(2.5)
            .boundary(Boundary::HalfOpen)
            .ellipsoid(Ellipsoid::GRS80)
            .geoid_interpolation(GeoidInterpolation::Nearest)
            .antialias(false)
            .build();
        config.save(&path).unwrap();
        let loaded = PipelineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let path = temp_path("version");
        let config = PipelineConfig::default();
        let env = serde_json::json!({
            "format": JSON_FORMAT_NAME,
            "version": JSON_VERSION + 1,
            "config": config,
        });
        std::fs::write(&path, env.to_string()).unwrap();
        let result = PipelineConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PipelineError::VersionMismatch { found: 2, expected: 1, .. })));
    }

    #[test]
    fn format_mismatch_is_rejected() {
        let path = temp_path("format");
        let env = serde_json::json!({
            "format": "something_else",
            "version": JSON_VERSION,
            "config": PipelineConfig::default(),
        });
        std::fs::write(&path, env.to_string()).unwrap();
        let result = PipelineConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PipelineError::FormatMismatch { .. })));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let result = PipelineConfig::load(temp_path("does_not_exist"));
        assert!(matches!(result, Err(PipelineError::Open { .. })));
    }
}
