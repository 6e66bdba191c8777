/////////////////////////////////////////////////////////////////////////////////////////////
//
// Runs the processing stages in order and reports progress to an optional sink.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::equivalent_sources::FitSummary;
use crate::error::Result;
use crate::grid::OutputGrid;
use crate::observations::ObservationTable;
use crate::progress::{emit, ProgressMsg, ProgressSink, Stage};
use crate::projection::Mercator;
use crate::raster::Raster;
use crate::stages::{
    correct_gravity, crop_inputs, grid_residual, project, resolve_geometric_height, separate_fields,
};

/// Data handed to [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Measured stations with the [`columns::BASE`](crate::observations::columns::BASE) columns.
    pub observations: ObservationTable,
    /// Topography above sea level on a geographic grid.
    pub topography: Raster,
    /// Geoid height above the ellipsoid on a geographic grid.
    pub geoid: Raster,
}

/// Everything produced by a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Cropped observations with every derived column.
    pub observations: ObservationTable,
    pub topography_projected: Raster,
    pub topography_geometric: Raster,
    pub projection: Mercator,
    pub regional_summary: FitSummary,
    pub residual_summary: FitSummary,
    pub grid: OutputGrid,
}

/// Chains the processing stages.
///
/// ```no_run
/// use bouguer::{Pipeline, PipelineConfig, PipelineInputs, io};
///
/// let inputs = PipelineInputs {
///     observations: io::read_observations_csv("gravity.csv")?,
///     topography: io::read_raster_csv("topography.csv", "topography")?,
///     geoid: io::read_raster_csv("geoid.csv", "geoid")?,
/// };
/// let output = Pipeline::new(PipelineConfig::default()).run(inputs)?;
/// io::write_grid_csv(&output.grid, "residual_grid.csv")?;
/// # Ok::<(), bouguer::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    /// Attaches a progress sink that receives stage and fit events.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn timed<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        emit(&self.progress_callback, ProgressMsg::StageStarted { stage });
        let start = Instant::now();
        let out = f()?;
        emit(
            &self.progress_callback,
            ProgressMsg::StageFinished {
                stage,
                elapsed: start.elapsed(),
            },
        );
        Ok(out)
    }

    fn report_fit(&self, label: &str, summary: &FitSummary) {
        emit(
            &self.progress_callback,
            ProgressMsg::FitSummary {
                label: label.to_string(),
                num_data: summary.num_data,
                num_sources: summary.num_sources,
                rms_misfit: summary.rms_misfit,
                condition_estimate: summary.condition_estimate,
            },
        );
    }

    /// Runs every stage on `inputs`.
    pub fn run(&self, inputs: PipelineInputs) -> Result<PipelineOutput> {
        let config = &self.config;
        config.validate()?;

        let cropped = self.timed(Stage::Crop, || {
            crop_inputs(config, &inputs.observations, &inputs.topography, &inputs.geoid)
        })?;
        emit(
            &self.progress_callback,
            ProgressMsg::PointsCropped {
                num_input: cropped.num_input,
                num_kept: cropped.observations.len(),
            },
        );

        let projected = self.timed(Stage::Project, || project(config, &cropped))?;
        let resolved = self.timed(Stage::GeometricHeight, || {
            resolve_geometric_height(config, &projected)
        })?;

        let corrected = self.timed(Stage::GravityCorrection, || correct_gravity(config, &resolved))?;
        if corrected.num_below_ellipsoid > 0 {
            emit(
                &self.progress_callback,
                ProgressMsg::Warning {
                    message: format!(
                        "{} of {} observations lie below the ellipsoid",
                        corrected.num_below_ellipsoid,
                        corrected.observations.len()
                    ),
                },
            );
        }

        let separated = self.timed(Stage::FieldSeparation, || separate_fields(config, &corrected))?;
        self.report_fit("regional", separated.regional.summary());

        let gridded = self.timed(Stage::Gridding, || grid_residual(config, &separated))?;
        self.report_fit("residual", gridded.residual.summary());

        Ok(PipelineOutput {
            observations: separated.observations,
            topography_projected: separated.topography,
            topography_geometric: separated.topography_geometric,
            projection: separated.projection,
            regional_summary: separated.regional.summary().clone(),
            residual_summary: gridded.residual.summary().clone(),
            grid: gridded.grid,
        })
    }
}
