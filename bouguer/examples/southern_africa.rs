use std::path::PathBuf;

use bouguer::{
    Pipeline, PipelineConfig, PipelineInputs, io,
    progress::{ProgressMsg, closure_sink},
};

/// Runs the pipeline on downloaded data.
///
/// Usage: `southern_africa <data dir> [config.json]`
///
/// The data directory must contain `gravity.csv` (longitude, latitude,
/// height_sea_level_m, gravity_mgal), `topography.csv` (longitude, latitude,
/// topography) and `geoid.csv` (longitude, latitude, geoid). Results are
/// written next to the inputs.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "datasets".to_string()));

    let config = match args.next() {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.save(data_dir.join("pipeline_config.json"))?;

    let inputs = PipelineInputs {
        observations: io::read_observations_csv(data_dir.join("gravity.csv"))?,
        topography: io::read_raster_csv(data_dir.join("topography.csv"), "topography")?,
        geoid: io::read_raster_csv(data_dir.join("geoid.csv"), "geoid")?,
    };
    log::info!(
        "loaded {} observations, topography {:?}, geoid {:?}",
        inputs.observations.len(),
        inputs.topography.shape(),
        inputs.geoid.shape()
    );

    let (sink, listener) = closure_sink(256, |msg| match msg {
        ProgressMsg::StageFinished { stage, elapsed } => log::info!("{stage:?}: {elapsed:.2?}"),
        ProgressMsg::PointsCropped { num_input, num_kept } => {
            log::info!("kept {num_kept} of {num_input} observations")
        }
        ProgressMsg::FitSummary {
            label,
            num_sources,
            rms_misfit,
            ..
        } => log::info!("{label}: {num_sources} sources, rms misfit {rms_misfit:.3} mGal"),
        ProgressMsg::Warning { message } => log::warn!("{message}"),
        other => log::debug!("{other:?}"),
    });

    let output = Pipeline::new(config).progress_callback(sink).run(inputs)?;

    io::write_observations_csv(&output.observations, data_dir.join("gravity_processed.csv"))?;
    io::write_raster_csv(&output.topography_geometric, data_dir.join("topography_geometric.csv"))?;
    io::write_grid_csv(&output.grid, data_dir.join("residual_grid.csv"))?;

    if listener.join().is_err() {
        log::error!("progress listener thread panicked");
    }
    Ok(())
}
