/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for the gravity processing pipeline.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Gravity data processing with equivalent sources.
//!
//! Turns point gravity observations, a topography raster and a geoid raster
//! into a residual gravity field and a regular grid of that field. The
//! processing runs as a fixed sequence of stages:
//!
//! 1. **Crop** the observations to the region of interest and the rasters to
//!    the region plus a padding margin.
//! 2. **Project** everything onto an ellipsoidal Mercator projection whose
//!    standard parallel is the mean latitude of the observations.
//! 3. **Resolve geometric heights** by adding the geoid to the sea-level
//!    topography and to each observation's height.
//! 4. **Correct gravity** by removing normal gravity and the attraction of a
//!    layer of right rectangular prisms built from the topography.
//! 5. **Separate fields** with deep equivalent sources, whose prediction is the
//!    regional field. The residual is the Bouguer disturbance minus the regional.
//! 6. **Grid** the residual with shallow equivalent sources on a regular
//!    latitude/longitude grid at a fixed height.
//!
//! Each stage is a plain function in [`stages`] and [`Pipeline`] chains them,
//! reporting progress to an optional [`progress::ProgressSink`].
//!
//! # Features
//! - Closed-form normal gravity on WGS84 or GRS80
//! - Exact prism terrain effect, parallel over stations and reproducible for any thread count
//! - Damped, column-scaled equivalent-source fits with condition checks
//! - Thin-plate spline or nearest-neighbour geoid interpolation
//! - JSON configuration files and CSV input/output
//! - Synthetic surveys for experiments and tests
//!
//! # Examples
//!
//! ```
//! use bouguer::{
//!     Pipeline, PipelineConfig, PipelineInputs, Region,
//!     observations::columns,
//!     synthetic::{StationLayout, SurveyGravity, SyntheticSurvey},
//! };
//!
//! let region = Region::new(25.0, 26.0, -24.0, -23.0)?;
//!
//! // Flat terrain, zero geoid and a constant reading at 3 x 3 stations
//! let survey = SyntheticSurvey::builder(region)
//!     .raster_spacing(0.25)
//!     .layout(StationLayout::Grid { nx: 3, ny: 3 })
//!     .gravity(SurveyGravity::Constant(978_500.0))
//!     .build()?;
//!
//! let config = PipelineConfig::builder()
//!     .region(region)
//!     .padding(0.5)
//!     .grid_spacing_deg(0.25)
//!     .build();
//!
//! let output = Pipeline::new(config).run(PipelineInputs {
//!     observations: survey.observations,
//!     topography: survey.topography,
//!     geoid: survey.geoid,
//! })?;
//!
//! // No terrain, so the Bouguer disturbance is the plain disturbance
//! let obs = &output.observations;
//! assert_eq!(obs.column(columns::BOUGUER)?, obs.column(columns::DISTURBANCE)?);
//! assert_eq!(output.grid.shape(), (5, 5));
//! # Ok::<(), bouguer::PipelineError>(())
//! ```
//!
//! # References
//! 1.  Li, X. and Götze, H.-J., 2001. Ellipsoid, geoid, gravity, geodesy, and
//!     geophysics. Geophysics, 66(6), pp.1660-1668.
//! 2.  Nagy, D., Papp, G. and Benedek, J., 2000. The gravitational potential and
//!     its derivatives for the prism. Journal of Geodesy, 74(7), pp.552-560.
//! 3.  Dampney, C.N.G., 1969. The equivalent source technique. Geophysics, 34(1),
//!     pp.39-53.
//! 4.  Snyder, J.P., 1987. Map Projections: A Working Manual. USGS Professional
//!     Paper 1395.
pub mod config;

mod ellipsoid;

mod equivalent_sources;

mod error;

mod geoid;

mod grid;

mod gridders;

pub mod io;

mod linalg;

mod nearest;

mod normal_gravity;

pub mod observations;

mod pipeline;

mod polynomials;

mod prism;

pub mod progress;

mod projection;

mod raster;

mod region;

mod reproject;

mod source_config;

mod spatial;

mod spline;

pub mod stages;

pub mod synthetic;

pub use {
    config::{PipelineConfig, PipelineConfigBuilder},
    ellipsoid::Ellipsoid,
    equivalent_sources::{EquivalentSources, FitSummary, FittedSources},
    error::{PipelineError, Result},
    geoid::{TOPOGRAPHY_GEOMETRIC, geoid_at_points, geometric_height, geometric_topography},
    grid::{OutputGrid, grid_coordinates, grid_model},
    gridders::{GeoidInterpolation, Gridder, Predictor},
    linalg::{DampedSolution, damped_least_squares},
    nearest::{NearestGridder, NearestModel},
    normal_gravity::{normal_gravity, normal_gravity_many},
    observations::ObservationTable,
    pipeline::{Pipeline, PipelineInputs, PipelineOutput},
    prism::{DensityModel, DensityParams, Prism, PrismLayer},
    projection::{Mercator, Projection},
    raster::{CoordinateKind, Raster},
    region::{Boundary, Region},
    reproject::project_raster,
    source_config::{
        EquivalentSourceSettings, EquivalentSourceSettingsBuilder, SourceKernel, SourceLayout,
    },
    spatial::PointIndex,
    spline::{SplineGridder, SplineModel},
};
