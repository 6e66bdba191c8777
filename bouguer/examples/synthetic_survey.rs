use std::sync::Arc;

use bouguer::{
    EquivalentSourceSettings, Pipeline, PipelineConfig, PipelineInputs, Region, SourceLayout,
    io,
    progress::{ProgressMsg, closure_sink},
    synthetic::{SphereAnomaly, StationLayout, SurveyGravity, SyntheticSurvey, Terrain},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // A 2 x 2 degree survey over a hill with a dense body buried off to one side
    let region = Region::new(25.0, 27.0, -25.0, -23.0)?;
    let survey = SyntheticSurvey::builder(region)
        .padding(1.0)
        .raster_spacing(0.05)
        .terrain(Terrain::GaussianHill {
            longitude: 25.8,
            latitude: -24.2,
            height: 1200.0,
            width: 0.3,
        })
        .geoid(28.0, 1.2)
        .layout(StationLayout::Random { count: 400 })
        .gravity(SurveyGravity::Modelled {
            anomaly: Some(SphereAnomaly {
                longitude: 26.3,
                latitude: -23.7,
                depth: 4000.0,
                radius: 2500.0,
                density_contrast: 300.0,
            }),
            noise_mgal: 0.2,
        })
        .seed(42)
        .build()?;

    // Block-average the residual sources to keep the solve small
    let residual = EquivalentSourceSettings::builder()
        .damping(10.0)
        .depth(10e3)
        .layout(SourceLayout::BlockAveraged { block_size: 10e3 })
        .build();

    let config = PipelineConfig::builder()
        .region(region)
        .padding(0.5)
        .residual(residual)
        .grid_spacing_deg(2.0 / 60.0)
        .build();

    let (sink, listener) = closure_sink(256, |msg| match msg {
        ProgressMsg::StageStarted { stage } => log::info!("{stage:?} started"),
        ProgressMsg::StageFinished { stage, elapsed } => log::info!("{stage:?} finished in {elapsed:.2?}"),
        ProgressMsg::PointsCropped { num_input, num_kept } => {
            log::info!("kept {num_kept} of {num_input} observations")
        }
        ProgressMsg::FitSummary {
            label,
            num_data,
            num_sources,
            rms_misfit,
            condition_estimate,
        } => log::info!(
            "{label} fit: {num_data} data, {num_sources} sources, rms misfit {rms_misfit:.3} mGal, condition {condition_estimate:.3e}"
        ),
        ProgressMsg::Warning { message } => log::warn!("{message}"),
        ProgressMsg::Message { message } => log::info!("{message}"),
    });

    let pipeline = Pipeline::new(config).progress_callback(Arc::clone(&sink));
    let output = pipeline.run(PipelineInputs {
        observations: survey.observations,
        topography: survey.topography,
        geoid: survey.geoid,
    })?;

    let out_dir = std::env::temp_dir().join("bouguer_synthetic");
    std::fs::create_dir_all(&out_dir)?;
    io::write_observations_csv(&output.observations, out_dir.join("observations.csv"))?;
    io::write_grid_csv(&output.grid, out_dir.join("residual_grid.csv"))?;
    log::info!("results written to {}", out_dir.display());

    drop(pipeline);
    drop(sink);
    if listener.join().is_err() {
        log::error!("progress listener thread panicked");
    }

    Ok(())
}
