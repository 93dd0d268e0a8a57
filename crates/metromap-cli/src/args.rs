//! Command-line argument definitions for the metromap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments name the network file, the JSON lookup files it
//! is compiled against, the output path, configuration file selection and
//! logging verbosity.

use clap::Parser;

/// Command-line arguments for the metro map generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input network file
    #[arg(help = "Path to the network file")]
    pub network: String,

    /// Path to the curve template file (JSON), overriding `inputs.templates`
    #[arg(long)]
    pub templates: Option<String>,

    /// Path to the station id file (JSON), overriding `inputs.station_ids`
    #[arg(long)]
    pub station_ids: Option<String>,

    /// Path to the line color file (JSON), overriding `inputs.colors`
    #[arg(long)]
    pub colors: Option<String>,

    /// Path to the output JSON file
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Drawn line width, overriding `geometry.line_width`
    #[arg(long)]
    pub line_width: Option<u32>,

    /// Template scale, overriding `geometry.scale_factor`
    #[arg(long)]
    pub scale_factor: Option<f64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "metromap",
            "map.metro",
            "--templates",
            "templates.json",
            "--station-ids",
            "ids.json",
        ])
        .unwrap();

        assert_eq!(args.network, "map.metro");
        assert_eq!(args.station_ids.as_deref(), Some("ids.json"));
        assert_eq!(args.colors, None);
        assert_eq!(args.output, "out.json");
        assert_eq!(args.config, None);
        assert_eq!(args.line_width, None);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_geometry_overrides() {
        let args = Args::try_parse_from([
            "metromap",
            "map.metro",
            "--line-width",
            "30",
            "--scale-factor",
            "2.5",
        ])
        .unwrap();

        assert_eq!(args.line_width, Some(30));
        assert_eq!(args.scale_factor, Some(2.5));
    }

    #[test]
    fn test_network_is_required() {
        assert!(Args::try_parse_from(["metromap", "--colors", "colors.json"]).is_err());
    }
}
