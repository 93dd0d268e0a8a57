//! CLI logic for the metro map generator.
//!
//! Reads the network file and its JSON lookup files, runs the
//! [`MapBuilder`] pipeline and writes the map document.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{debug, info};

use metromap::{CurveTemplates, LineColors, MapBuilder, MapInputs, MetroMapError, StationIdTable};

use config::RunSettings;

/// Run the metromap CLI application
///
/// The output file is only written once the whole map has been built, so a
/// failing run never leaves a partial document behind.
///
/// # Errors
///
/// Returns `MetroMapError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed lookup files
/// - Parsing errors
/// - Consistency, solver and synthesis errors
pub fn run(args: &Args) -> Result<(), MetroMapError> {
    info!(
        network_path = args.network,
        output_path = args.output;
        "Processing network"
    );

    let settings = config::resolve(args)?;

    let inputs = read_inputs(&settings)?;
    let source = fs::read_to_string(&args.network)?;

    let builder = MapBuilder::new(settings.config);
    let json = builder.render_json(&source, &inputs)?;

    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Map exported successfully");

    Ok(())
}

fn read_inputs(settings: &RunSettings) -> Result<MapInputs, MetroMapError> {
    let templates = CurveTemplates::from_json(&fs::read_to_string(&settings.templates)?)?;
    let station_ids = StationIdTable::from_json(&fs::read_to_string(&settings.station_ids)?)?;
    let colors = LineColors::from_json(&fs::read_to_string(&settings.colors)?)?;

    debug!(station_ids = station_ids.len(); "Lookup files loaded");
    Ok(MapInputs::new(station_ids, templates, colors))
}
