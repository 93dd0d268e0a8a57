//! Settings for one CLI run.
//!
//! A config file holds the library's sections plus an optional `[inputs]`
//! table naming the lookup files, relative to the config file. It is looked
//! up in order: the `--config` path, `metromap/config.toml`, then the
//! platform config directory. Command-line flags override the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use metromap::{
    MetroMapError,
    config::{AppConfig, GeometryConfig},
};

use crate::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("No {0} file given, pass --{1} or set inputs.{0} in the config file")]
    MissingInput(&'static str, &'static str),
}

impl From<ConfigError> for MetroMapError {
    fn from(err: ConfigError) -> Self {
        MetroMapError::Config(err.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    map: AppConfig,

    #[serde(default)]
    inputs: InputFiles,
}

/// Lookup files named by a config file.
#[derive(Debug, Default, Deserialize)]
struct InputFiles {
    templates: Option<PathBuf>,
    colors: Option<PathBuf>,
    station_ids: Option<PathBuf>,
}

impl InputFiles {
    fn relative_to(self, dir: &Path) -> Self {
        Self {
            templates: self.templates.map(|path| dir.join(path)),
            colors: self.colors.map(|path| dir.join(path)),
            station_ids: self.station_ids.map(|path| dir.join(path)),
        }
    }
}

/// Everything a run needs besides the network file.
#[derive(Debug)]
pub struct RunSettings {
    pub config: AppConfig,
    pub templates: PathBuf,
    pub colors: PathBuf,
    pub station_ids: PathBuf,
}

/// Resolves the map configuration and lookup file paths for `args`.
///
/// # Errors
///
/// Returns [`MetroMapError::Config`] when an explicit config file is
/// missing or malformed, when a lookup file is named nowhere, or when a
/// setting is out of range after the overrides are applied.
pub fn resolve(args: &Args) -> Result<RunSettings, MetroMapError> {
    let file = find_config_file(args.config.as_deref())?;

    let geometry = file.map.geometry();
    let geometry = GeometryConfig::new(
        args.scale_factor.unwrap_or(geometry.scale_factor()),
        args.line_width.unwrap_or(geometry.line_width()),
    );
    let config = AppConfig::new(
        geometry,
        file.map.solver().clone(),
        file.map.endpoint().clone(),
        file.map.curves().clone(),
        file.map.station_ids().clone(),
    );
    config.validate()?;

    let pick = |flag: &Option<String>,
                from_file: Option<PathBuf>,
                key: &'static str,
                option: &'static str| {
        flag.as_ref()
            .map(PathBuf::from)
            .or(from_file)
            .ok_or(ConfigError::MissingInput(key, option))
    };
    let inputs = file.inputs;
    let settings = RunSettings {
        config,
        templates: pick(&args.templates, inputs.templates, "templates", "templates")?,
        colors: pick(&args.colors, inputs.colors, "colors", "colors")?,
        station_ids: pick(&args.station_ids, inputs.station_ids, "station_ids", "station-ids")?,
    };
    debug!(settings:?; "Resolved run settings");
    Ok(settings)
}

fn find_config_file(explicit_path: Option<&str>) -> Result<ConfigFile, MetroMapError> {
    if let Some(path) = explicit_path {
        info!(path; "Loading configuration from explicit path");
        return read_config_file(Path::new(path));
    }

    let local_config = Path::new("metromap/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return read_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "metromap", "metromap") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return read_config_file(&system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    }

    debug!("No configuration file found, using defaults");
    Ok(ConfigFile::default())
}

fn read_config_file(path: &Path) -> Result<ConfigFile, MetroMapError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let dir = path.parent().unwrap_or(Path::new("."));
    Ok(ConfigFile {
        map: file.map,
        inputs: file.inputs.relative_to(dir),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["metromap", "map.metro"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn write_config(dir: &Path, content: &str) -> String {
        let path = dir.join("config.toml");
        fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_inputs_resolve_next_to_config() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "[geometry]\nline_width = 40\n\n[inputs]\ntemplates = \"data/templates.json\"\ncolors = \"data/colors.json\"\nstation_ids = \"/srv/ids.json\"\n",
        );

        let settings = resolve(&args(&["--config", &config])).unwrap();

        assert_eq!(settings.config.geometry().line_width(), 40);
        assert_eq!(settings.templates, dir.path().join("data/templates.json"));
        assert_eq!(settings.colors, dir.path().join("data/colors.json"));
        assert_eq!(settings.station_ids, PathBuf::from("/srv/ids.json"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "[geometry]\nline_width = 40\nscale_factor = 4.0\n\n[inputs]\ncolors = \"colors.json\"\n",
        );

        let settings = resolve(&args(&[
            "--config",
            &config,
            "--line-width",
            "30",
            "--templates",
            "t.json",
            "--colors",
            "mine.json",
            "--station-ids",
            "ids.json",
        ]))
        .unwrap();

        assert_eq!(settings.config.geometry().line_width(), 30);
        assert_eq!(settings.config.geometry().scale_factor(), 4.0);
        assert_eq!(settings.colors, PathBuf::from("mine.json"));
    }

    #[test]
    fn test_station_id_overrides_survive_flags() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "[[station_ids.overrides]]\nline = \"red\"\nstation = \"West\"\nid = \"HQ\"\n",
        );

        let settings = resolve(&args(&[
            "--config",
            &config,
            "--scale-factor",
            "2.5",
            "--templates",
            "t.json",
            "--colors",
            "c.json",
            "--station-ids",
            "ids.json",
        ]))
        .unwrap();

        assert_eq!(settings.config.geometry().scale_factor(), 2.5);
        assert_eq!(settings.config.station_ids().overrides()[0].id(), "HQ");
    }

    #[test]
    fn test_lookup_file_must_be_named() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "[inputs]\ntemplates = \"t.json\"\n");

        let err = resolve(&args(&["--config", &config, "--colors", "c.json"])).unwrap_err();

        assert!(matches!(err, MetroMapError::Config(_)));
        assert!(err.to_string().contains("--station-ids"), "{err}");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let absent = dir.path().join("absent.toml").display().to_string();

        let err = resolve(&args(&["--config", &absent])).unwrap_err();

        assert!(err.to_string().contains("Missing configuration file"));
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "[geometry\nline_width = 40");

        let err = resolve(&args(&["--config", &config])).unwrap_err();

        assert!(err.to_string().contains("config.toml"), "{err}");
    }

    #[test]
    fn test_odd_line_width_flag_rejected() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "");

        let err = resolve(&args(&[
            "--config",
            &config,
            "--line-width",
            "45",
            "--templates",
            "t.json",
            "--colors",
            "c.json",
            "--station-ids",
            "ids.json",
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("line_width"), "{err}");
    }
}
