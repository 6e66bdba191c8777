/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the processing stages as pure functions over the previous stage's output.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! The six processing stages.
//!
//! Each stage takes the configuration and the previous stage's output and
//! returns a new value holding an augmented copy of the observation table.
//! [`Pipeline`](crate::Pipeline) chains them, but every stage can be
//! called on its own.

use bouguer_utils::mean;

use crate::config::PipelineConfig;
use crate::equivalent_sources::{EquivalentSources, FittedSources};
use crate::error::{PipelineError, Result};
use crate::geoid::{geoid_at_points, geometric_height, geometric_topography};
use crate::grid::{grid_model, OutputGrid};
use crate::gridders::{Gridder, Predictor};
use crate::normal_gravity::normal_gravity_many;
use crate::observations::{columns, ObservationTable};
use crate::prism::{DensityModel, PrismLayer};
use crate::projection::{Mercator, Projection};
use crate::raster::Raster;
use crate::reproject::project_raster;

/// Planar coordinates used for every source fit.
const FIT_COLUMNS: [&str; 3] = [columns::EASTING, columns::NORTHING, columns::HEIGHT_GEOMETRIC];

/// Observations inside the region and rasters cropped to the padded region.
#[derive(Debug, Clone)]
pub struct Cropped {
    pub observations: ObservationTable,
    pub topography: Raster,
    pub geoid: Raster,
    /// Number of observations before cropping.
    pub num_input: usize,
}

/// Everything in planar coordinates.
#[derive(Debug, Clone)]
pub struct Projected {
    pub observations: ObservationTable,
    pub topography: Raster,
    pub geoid: Raster,
    pub projection: Mercator,
}

/// Heights referenced to the ellipsoid.
#[derive(Debug, Clone)]
pub struct HeightsResolved {
    pub observations: ObservationTable,
    /// Projected topography above sea level.
    pub topography: Raster,
    /// Projected topography above the ellipsoid.
    pub topography_geometric: Raster,
    pub projection: Mercator,
}

/// Gravity disturbance with the terrain removed.
#[derive(Debug, Clone)]
pub struct GravityCorrected {
    pub observations: ObservationTable,
    pub topography: Raster,
    pub topography_geometric: Raster,
    pub projection: Mercator,
    /// Number of observations with a negative geometric height.
    pub num_below_ellipsoid: usize,
}

/// Bouguer disturbance split into regional and residual parts.
#[derive(Debug, Clone)]
pub struct FieldsSeparated {
    pub observations: ObservationTable,
    pub topography: Raster,
    pub topography_geometric: Raster,
    pub projection: Mercator,
    pub regional: FittedSources,
}

/// Residual sources and the grid they predict.
#[derive(Debug, Clone)]
pub struct Gridded {
    pub residual: FittedSources,
    pub grid: OutputGrid,
}

/// Keeps the observations inside `config.region` and crops both rasters to the
/// region grown by `config.padding`.
pub fn crop_inputs(
    config: &PipelineConfig,
    observations: &ObservationTable,
    topography: &Raster,
    geoid: &Raster,
) -> Result<Cropped> {
    config.region.validate()?;
    let padded = config.region.pad(config.padding)?;

    let keep = config.region.inside_indices(
        observations.column(columns::LONGITUDE)?,
        observations.column(columns::LATITUDE)?,
        config.boundary,
    );
    if keep.is_empty() {
        return Err(PipelineError::EmptyRegion {
            context: "cropping observations".into(),
            region: config.region,
            num_input: observations.len(),
        });
    }

    Ok(Cropped {
        observations: observations.select_rows(&keep),
        topography: topography.crop(&padded)?,
        geoid: geoid.crop(&padded)?,
        num_input: observations.len(),
    })
}

/// Builds the Mercator projection centred on the mean latitude of the
/// observations and moves the observations and both rasters onto it.
pub fn project(config: &PipelineConfig, cropped: &Cropped) -> Result<Projected> {
    let lon = cropped.observations.column(columns::LONGITUDE)?;
    let lat = cropped.observations.column(columns::LATITUDE)?;

    let projection = Mercator::new(config.ellipsoid, mean(lat))?;
    let (easting, northing) = projection.forward_many(lon, lat);

    let mut observations = cropped.observations.clone();
    observations.push_column(columns::EASTING, easting)?;
    observations.push_column(columns::NORTHING, northing)?;

    Ok(Projected {
        observations,
        topography: project_raster(&cropped.topography, &projection, config.antialias)?,
        geoid: project_raster(&cropped.geoid, &projection, config.antialias)?,
        projection,
    })
}

/// Adds the `geoid` and geometric height columns and the topography above the
/// ellipsoid.
pub fn resolve_geometric_height(config: &PipelineConfig, projected: &Projected) -> Result<HeightsResolved> {
    let topography_geometric = geometric_topography(&projected.topography, &projected.geoid)?;

    let observations = &projected.observations;
    let geoid = geoid_at_points(
        &projected.geoid,
        observations.column(columns::EASTING)?,
        observations.column(columns::NORTHING)?,
        config.geoid_interpolation,
    )?;
    let height = geometric_height(observations.column(columns::HEIGHT_SEA_LEVEL)?, &geoid)?;

    let mut observations = observations.clone();
    observations.push_column(columns::GEOID, geoid)?;
    observations.push_column(columns::HEIGHT_GEOMETRIC, height)?;

    Ok(HeightsResolved {
        observations,
        topography: projected.topography.clone(),
        topography_geometric,
        projection: projected.projection,
    })
}

/// Adds normal gravity, the disturbance, the terrain effect and the Bouguer
/// disturbance.
///
/// The terrain is a layer of prisms between the ellipsoid and the geometric
/// topography, evaluated at each observation's planar position and
/// geometric height.
pub fn correct_gravity(config: &PipelineConfig, resolved: &HeightsResolved) -> Result<GravityCorrected> {
    let observations = &resolved.observations;
    let latitude = observations.column(columns::LATITUDE)?;
    let height = observations.column(columns::HEIGHT_GEOMETRIC)?;
    let gravity = observations.column(columns::GRAVITY)?;

    let normal = normal_gravity_many(&config.ellipsoid, latitude, height)?;
    let disturbance = gravity.iter().zip(normal.iter()).map(|(g, n)| g - n).collect::<Vec<_>>();

    let density = DensityModel::from_topography(
        &resolved.topography_geometric,
        &resolved.topography,
        &config.density,
    )?;
    let layer = PrismLayer::from_raster(&resolved.topography_geometric, 0.0, &density)?;
    let terrain = layer.gravity_z(
        observations.column(columns::EASTING)?,
        observations.column(columns::NORTHING)?,
        height,
    )?;

    let bouguer = disturbance.iter().zip(terrain.iter()).map(|(d, t)| d - t).collect::<Vec<_>>();

    let mut observations = observations.clone();
    observations.push_column(columns::NORMAL_GRAVITY, normal)?;
    observations.push_column(columns::DISTURBANCE, disturbance)?;
    observations.push_column(columns::TERRAIN_EFFECT, terrain)?;
    observations.push_column(columns::BOUGUER, bouguer)?;

    Ok(GravityCorrected {
        observations,
        topography: resolved.topography.clone(),
        topography_geometric: resolved.topography_geometric.clone(),
        projection: resolved.projection,
        num_below_ellipsoid: height.iter().filter(|h| **h < 0.0).count(),
    })
}

/// Fits the regional sources to the Bouguer disturbance and adds the regional
/// and residual columns.
pub fn separate_fields(config: &PipelineConfig, corrected: &GravityCorrected) -> Result<FieldsSeparated> {
    let observations = &corrected.observations;
    let coordinates = observations.to_mat(&FIT_COLUMNS)?;
    let bouguer = observations.column(columns::BOUGUER)?;

    let regional = EquivalentSources::new(config.regional.clone()).fit(&coordinates, bouguer)?;
    let predicted = regional.predict(&coordinates)?;
    let residual = bouguer.iter().zip(predicted.iter()).map(|(b, r)| b - r).collect::<Vec<_>>();

    let mut observations = observations.clone();
    observations.push_column(columns::REGIONAL, predicted)?;
    observations.push_column(columns::RESIDUAL, residual)?;

    Ok(FieldsSeparated {
        observations,
        topography: corrected.topography.clone(),
        topography_geometric: corrected.topography_geometric.clone(),
        projection: corrected.projection,
        regional,
    })
}

/// Fits the residual sources and predicts them on a regular geographic grid
/// over the unpadded region.
pub fn grid_residual(config: &PipelineConfig, separated: &FieldsSeparated) -> Result<Gridded> {
    let observations = &separated.observations;
    let coordinates = observations.to_mat(&FIT_COLUMNS)?;
    let residual_values = observations.column(columns::RESIDUAL)?;

    let residual = EquivalentSources::new(config.residual.clone()).fit(&coordinates, residual_values)?;
    let grid = grid_model(
        columns::RESIDUAL,
        &residual,
        &config.region,
        config.grid_spacing_deg,
        config.grid_height_m,
        &separated.projection,
    )?;

    Ok(Gridded { residual, grid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Boundary, Region};
    use crate::synthetic::{StationLayout, SurveyGravity, SyntheticSurvey, Terrain};

    fn region() -> Region {
        Region::new(25.0, 26.0, -24.0, -23.0).unwrap()
    }

    fn config(boundary: Boundary) -> PipelineConfig {
        PipelineConfig::builder()
            .region(region())
            .padding(0.5)
            .boundary(boundary)
            .build()
    }

    fn flat_survey() -> SyntheticSurvey {
        SyntheticSurvey::builder(region())
            .padding(1.0)
            .raster_spacing(0.25)
            .layout(StationLayout::Grid { nx: 3, ny: 3 })
            .gravity(SurveyGravity::Constant(978_500.0))
            .build()
            .unwrap()
    }

    #[test]
    fn inclusive_crop_keeps_stations_on_every_edge() {
        let survey = flat_survey();
        let cropped = crop_inputs(
            &config(Boundary::Inclusive),
            &survey.observations,
            &survey.topography,
            &survey.geoid,
        )
        .unwrap();

        assert_eq!(cropped.observations.len(), 9);
        assert_eq!(cropped.num_input, 9);
        assert_eq!(cropped.topography.region(), region().pad(0.5).unwrap());
        assert_eq!(cropped.geoid.shape(), (9, 9));
    }

    #[test]
    fn half_open_crop_drops_east_and_north_edges() {
        let survey = flat_survey();
        let cropped = crop_inputs(
            &config(Boundary::HalfOpen),
            &survey.observations,
            &survey.topography,
            &survey.geoid,
        )
        .unwrap();

        // Stations sit at lon 25, 25.5, 26 and lat -24, -23.5, -23.
        assert_eq!(cropped.observations.original_indices(), &[0, 1, 3, 4]);
        assert!(cropped
            .observations
            .column(columns::LONGITUDE)
            .unwrap()
            .iter()
            .all(|lon| *lon < 26.0));
    }

    #[test]
    fn crop_outside_every_station_is_an_error() {
        let survey = flat_survey();
        let config = PipelineConfig::builder()
            .region(Region::new(27.0, 28.0, -24.0, -23.0).unwrap())
            .padding(0.0)
            .build();

        let result = crop_inputs(&config, &survey.observations, &survey.topography, &survey.geoid);
        assert!(matches!(
            result,
            Err(PipelineError::EmptyRegion { num_input: 9, .. })
        ));
    }

    #[test]
    fn projection_is_centred_on_mean_latitude() {
        let survey = flat_survey();
        let config = config(Boundary::Inclusive);
        let cropped = crop_inputs(&config, &survey.observations, &survey.topography, &survey.geoid).unwrap();
        let projected = project(&config, &cropped).unwrap();

        assert!((projected.projection.lat_ts() + 23.5).abs() < 1e-12);
        assert!(projected.observations.has_column(columns::EASTING));
        assert_eq!(projected.topography.shape(), cropped.topography.shape());

        let easting = projected.observations.column(columns::EASTING).unwrap();
        let (expected, _) = projected.projection.forward(25.5, -24.0);
        assert!((easting[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn flat_terrain_has_no_terrain_effect() {
        let survey = flat_survey();
        let config = config(Boundary::Inclusive);
        let cropped = crop_inputs(&config, &survey.observations, &survey.topography, &survey.geoid).unwrap();
        let projected = project(&config, &cropped).unwrap();
        let resolved = resolve_geometric_height(&config, &projected).unwrap();
        let corrected = correct_gravity(&config, &resolved).unwrap();

        let obs = &corrected.observations;
        let terrain = obs.column(columns::TERRAIN_EFFECT).unwrap();
        assert!(terrain.iter().all(|t| t.abs() < 1e-9));
        assert_eq!(
            obs.column(columns::BOUGUER).unwrap(),
            obs.column(columns::DISTURBANCE).unwrap()
        );
        assert_eq!(corrected.num_below_ellipsoid, 0);
    }

    #[test]
    fn basin_stations_are_counted_below_the_ellipsoid() {
        let survey = SyntheticSurvey::builder(region())
            .raster_spacing(0.25)
            .terrain(Terrain::GaussianHill {
                longitude: 25.5,
                latitude: -23.5,
                height: -200.0,
                width: 0.3,
            })
            .layout(StationLayout::Grid { nx: 3, ny: 3 })
            .build()
            .unwrap();

        let config = config(Boundary::Inclusive);
        let cropped = crop_inputs(&config, &survey.observations, &survey.topography, &survey.geoid).unwrap();
        let projected = project(&config, &cropped).unwrap();
        let resolved = resolve_geometric_height(&config, &projected).unwrap();
        let corrected = correct_gravity(&config, &resolved).unwrap();

        assert_eq!(corrected.num_below_ellipsoid, 9);
    }
}
