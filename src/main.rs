//! roi5d command line tool: crop a local volume to a set of ROIs and write
//! the result as a NumPy array.

mod cli;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use clap::Parser;

use roi5d::bounds::compute_bounds;
use roi5d::config::EngineConfig;
use roi5d::convert::{GroupingOptions, group_4d, id_property, ungroup_4d_with};
use roi5d::local::LocalShape;
use roi5d::pixels::{PixelSource, fetch_request, fetch_volume};
use roi5d::roi::{Roi, rois_from_json};
use roi5d::shape::ShapeModel;
use roi5d::sources::LoaderRegistry;

use crate::cli::Cli;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_config(cli: &Cli) -> CliResult<EngineConfig> {
    match &cli.config {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn grouping_options(cli: &Cli, config: &EngineConfig) -> GroupingOptions {
    let options = config.grouping();
    match &cli.id_property {
        Some(property) => options.with_id_property(id_property(property)),
        None => options,
    }
}

/// ROIs named on the command line, either saved or grouped from local shapes.
fn load_rois(cli: &Cli, grouping: &GroupingOptions) -> CliResult<Option<Vec<Roi>>> {
    if let Some(path) = &cli.rois {
        let rois = rois_from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded {} ROI(s) from {:?}", rois.len(), path);
        return Ok(Some(rois));
    }
    if let Some(path) = &cli.local {
        let shapes: Vec<LocalShape> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let grouped = group_4d(&shapes, &grouping.id_property);
        log::info!(
            "Grouped {} local shape(s) from {:?} into {} ROI(s) by '{}' ({} skipped)",
            shapes.len(),
            path,
            grouped.rois.len(),
            grouping.id_property,
            grouped.warnings.len()
        );
        return Ok(Some(grouped.rois));
    }
    Ok(None)
}

fn export_local(path: &Path, rois: &[Roi], grouping: &GroupingOptions) -> CliResult<()> {
    let shapes = ungroup_4d_with(rois, grouping);
    std::fs::write(path, serde_json::to_string_pretty(&shapes)?)?;
    log::info!("Wrote {} local shape(s) to {:?}", shapes.len(), path);
    Ok(())
}

fn run(cli: Cli, config: EngineConfig) -> CliResult<()> {
    let grouping = grouping_options(&cli, &config);

    let registry = LoaderRegistry::new();
    log::debug!("Supported inputs: {}", registry.supported_extensions().join(", "));
    let source = registry.load_file(&cli.input)?;
    let dims = source.dimensions();
    log::info!(
        "Loaded {:?}: {}x{}x{}x{}x{} {}",
        cli.input,
        dims.size_x,
        dims.size_y,
        dims.size_c,
        dims.size_z,
        dims.size_t,
        dims.pixel_type
    );

    let volume = match load_rois(&cli, &grouping)? {
        Some(rois) => {
            if let Some(path) = &cli.export_local {
                export_local(path, &rois, &grouping)?;
            }
            let shapes: Vec<ShapeModel> = rois
                .iter()
                .flat_map(|roi| roi.shapes().iter().cloned())
                .collect();
            let bounds = compute_bounds(&shapes)?;
            log::info!("ROI bounds: {}", bounds);
            fetch_volume(&source, &bounds, dims.pixel_type)?
        }
        None => fetch_request(&source, &cli.axis_request())?,
    };

    log::info!(
        "Volume {:?}, intensity range [{}, {}]",
        volume.shape(),
        volume.min(),
        volume.max()
    );
    let calibration = volume.calibration();
    if calibration.is_calibrated() {
        log::info!(
            "Pixel size x={:?} y={:?} z={:?}",
            calibration.x.map(|s| s.to_string()),
            calibration.y.map(|s| s.to_string()),
            calibration.z.map(|s| s.to_string())
        );
    }

    let writer = BufWriter::new(File::create(&cli.output)?);
    volume.data().write_npy(writer)?;
    log::info!("Wrote {:?}", cli.output);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("roi5d: failed to load config: {}", e);
            std::process::exit(2);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::debug!("Log level: {}", config.log_level.name());

    if let Err(e) = run(cli, config) {
        log::error!("{}", e);
        eprintln!("roi5d: {}", e);
        std::process::exit(1);
    }
}
