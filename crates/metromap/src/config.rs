//! Configuration types for metro map generation.
//!
//! This module provides configuration structures that control map geometry,
//! the coordinate solver, endpoint decorations and curve synthesis. All
//! types implement [`serde::Deserialize`] for flexible loading from
//! external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`GeometryConfig`] - Grid scale and line width.
//! - [`SolverConfig`] - Weights of the least-squares station placement.
//! - [`EndpointConfig`] - Size of terminal decorations.
//! - [`CurveConfig`] - Sampling of parallel curves.
//! - [`StationIdConfig`] - Station ids that override the lookup table.
//!
//! # Example
//!
//! ```
//! # use metromap::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert_eq!(config.geometry().line_width(), 50);
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::MetroMapError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Geometry configuration section.
    #[serde(default)]
    geometry: GeometryConfig,

    /// Coordinate solver configuration section.
    #[serde(default)]
    solver: SolverConfig,

    /// Endpoint decoration configuration section.
    #[serde(default)]
    endpoint: EndpointConfig,

    /// Curve synthesis configuration section.
    #[serde(default)]
    curves: CurveConfig,

    /// Station id override section.
    #[serde(default)]
    station_ids: StationIdConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        geometry: GeometryConfig,
        solver: SolverConfig,
        endpoint: EndpointConfig,
        curves: CurveConfig,
        station_ids: StationIdConfig,
    ) -> Self {
        Self {
            geometry,
            solver,
            endpoint,
            curves,
            station_ids,
        }
    }

    /// Returns the geometry configuration.
    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    /// Returns the coordinate solver configuration.
    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    /// Returns the endpoint decoration configuration.
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Returns the curve synthesis configuration.
    pub fn curves(&self) -> &CurveConfig {
        &self.curves
    }

    /// Returns the station id overrides.
    pub fn station_ids(&self) -> &StationIdConfig {
        &self.station_ids
    }

    /// Checks every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<(), MetroMapError> {
        let invalid = |message: String| Err(MetroMapError::Config(message));

        let scale_factor = self.geometry.scale_factor;
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return invalid(format!(
                "geometry.scale_factor must be positive, got {scale_factor}"
            ));
        }

        let line_width = self.geometry.line_width;
        if line_width == 0 || line_width % 2 != 0 {
            return invalid(format!(
                "geometry.line_width must be positive and even, got {line_width}"
            ));
        }

        let weight = self.solver.alignment_point_weight;
        if !(weight > 0.0 && weight < 1.0) {
            return invalid(format!(
                "solver.alignment_point_weight must be between 0 and 1, got {weight}"
            ));
        }

        let length_factor = self.endpoint.length_factor;
        if !(length_factor.is_finite() && length_factor > 0.0) {
            return invalid(format!(
                "endpoint.length_factor must be positive, got {length_factor}"
            ));
        }

        let samples = self.curves.offset_samples;
        if samples < MIN_OFFSET_SAMPLES {
            return invalid(format!(
                "curves.offset_samples must be at least {MIN_OFFSET_SAMPLES}, got {samples}"
            ));
        }

        Ok(())
    }
}

const MIN_OFFSET_SAMPLES: usize = 8;

/// Grid scale and line width.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Multiplier applied to curve template offsets.
    scale_factor: f64,

    /// Drawn line width in output units. Parallel curves and same-station
    /// offsets are one line width apart.
    line_width: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            scale_factor: 5.0,
            line_width: 50,
        }
    }
}

impl GeometryConfig {
    pub fn new(scale_factor: f64, line_width: u32) -> Self {
        Self {
            scale_factor,
            line_width,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }
}

/// Weights of the least-squares station placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Objective weight of alignment points relative to stations.
    alignment_point_weight: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            alignment_point_weight: 0.01,
        }
    }
}

impl SolverConfig {
    pub fn new(alignment_point_weight: f64) -> Self {
        Self {
            alignment_point_weight,
        }
    }

    pub fn alignment_point_weight(&self) -> f64 {
        self.alignment_point_weight
    }
}

/// Size of terminal decorations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full endpoint bar length in line widths.
    length_factor: f64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { length_factor: 3.0 }
    }
}

impl EndpointConfig {
    pub fn new(length_factor: f64) -> Self {
        Self { length_factor }
    }

    pub fn length_factor(&self) -> f64 {
        self.length_factor
    }
}

/// Sampling of parallel curves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Offset points sampled along each Bezier of a parallel curve's target.
    offset_samples: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self { offset_samples: 64 }
    }
}

impl CurveConfig {
    pub fn new(offset_samples: usize) -> Self {
        Self { offset_samples }
    }

    pub fn offset_samples(&self) -> usize {
        self.offset_samples
    }
}

/// One station id that wins over the lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StationIdOverride {
    line: String,
    station: String,
    id: String,
}

impl StationIdOverride {
    pub fn new(line: impl Into<String>, station: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            station: station.into(),
            id: id.into(),
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Station ids that override the lookup table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StationIdConfig {
    overrides: Vec<StationIdOverride>,
}

impl StationIdConfig {
    pub fn new(overrides: Vec<StationIdOverride>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &[StationIdOverride] {
        &self.overrides
    }
}
