//! Metromap - A compiler from metro network descriptions to map geometry.
//!
//! A network file sketches lines, stations and curves on an approximate
//! grid and states how they should align. This crate parses it, solves
//! exact station positions and line draw order, synthesizes every curve
//! from Bezier templates and assembles the JSON document a map renderer
//! draws from.

pub mod config;

mod curves;
mod error;
mod output;
mod solve;

pub use metromap_core::{curve, direction, endpoint, geometry, network, segment};
pub use metromap_parser::StationIdTable;

pub use curves::{
    CurvePaths, CurveTemplate, CurveTemplates, OffsetCurveFitter, SampledOffsetFitter,
    synthesize_curves,
};
pub use error::MetroMapError;
pub use output::{
    EdgeDocument, GridPoint, LineColors, LineDocument, MapDocument, SegmentDocument,
    StationDocument, assemble_document,
};
pub use solve::{
    EqualityLeastSquares, KktSolver, Layout, LeastSquaresProblem, LinearEquality, solve_layout,
};

use log::{debug, info, trace};

use config::AppConfig;
use network::Network;

/// The lookup data a map is built with besides its network file.
#[derive(Debug, Clone)]
pub struct MapInputs {
    station_ids: StationIdTable,
    templates: CurveTemplates,
    colors: LineColors,
}

impl MapInputs {
    pub fn new(station_ids: StationIdTable, templates: CurveTemplates, colors: LineColors) -> Self {
        Self {
            station_ids,
            templates,
            colors,
        }
    }

    pub fn station_ids(&self) -> &StationIdTable {
        &self.station_ids
    }

    pub fn templates(&self) -> &CurveTemplates {
        &self.templates
    }

    pub fn colors(&self) -> &LineColors {
        &self.colors
    }
}

/// Builder for compiling metro maps.
///
/// Each pipeline stage is available on its own; [`MapBuilder::render_json`]
/// runs all of them.
///
/// # Examples
///
/// ```rust,no_run
/// use metromap::{CurveTemplates, LineColors, MapBuilder, MapInputs, StationIdTable};
/// use metromap::config::AppConfig;
///
/// let source = std::fs::read_to_string("demos/two_lines.metro").expect("read network");
/// let templates = std::fs::read_to_string("demos/data/templates.json").expect("read templates");
/// let colors = std::fs::read_to_string("demos/data/colors.json").expect("read colors");
///
/// let ids = std::fs::read_to_string("demos/data/station_ids.json").expect("read ids");
///
/// let inputs = MapInputs::new(
///     StationIdTable::from_json(&ids).expect("station ids"),
///     CurveTemplates::from_json(&templates).expect("templates"),
///     LineColors::from_json(&colors).expect("colors"),
/// );
///
/// let builder = MapBuilder::new(AppConfig::default());
/// let json = builder.render_json(&source, &inputs).expect("Failed to build map");
/// println!("{json}");
/// ```
#[derive(Default)]
pub struct MapBuilder {
    config: AppConfig,
}

impl MapBuilder {
    /// Create a new map builder with the given configuration.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use metromap::{MapBuilder, config::AppConfig};
    ///
    /// let builder = MapBuilder::new(AppConfig::default());
    /// ```
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a network file.
    ///
    /// Station ids come from `station_ids`, with the overrides of the
    /// configuration taking precedence.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Parse`] carrying every diagnostic and the
    /// source they point into.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use metromap::{MapBuilder, StationIdTable};
    ///
    /// let mut ids = StationIdTable::new();
    /// ids.insert("red", "A", "1");
    /// ids.insert("red", "B", "2");
    ///
    /// let source = "line red:\nstation \"A\" 0 0\nstation \"B\" 10 0\nedges \"A, B\"\n";
    /// let network = MapBuilder::default()
    ///     .parse(source, &ids)
    ///     .expect("Failed to parse network");
    /// ```
    pub fn parse(&self, source: &str, station_ids: &StationIdTable) -> Result<Network, MetroMapError> {
        info!("Parsing network");

        let overrides = self.config.station_ids().overrides();
        let parsed = if overrides.is_empty() {
            metromap_parser::parse(source, station_ids)
        } else {
            let mut ids = station_ids.clone();
            for entry in overrides {
                ids.add_override(entry.line(), entry.station(), entry.id());
            }
            debug!(overrides = overrides.len(); "Applied station id overrides");
            metromap_parser::parse(source, &ids)
        };
        let network = parsed.map_err(|err| MetroMapError::new_parse_error(err, source))?;

        debug!(
            lines = network.line_count(),
            stations = network.station_count(),
            curves = network.curve_count();
            "Network parsed successfully"
        );
        trace!(network:?; "Parsed network");

        Ok(network)
    }

    /// Solve station positions and line draw order.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Solver`] for contradictory alignment
    /// constraints and [`MetroMapError::Consistency`] for cyclic z-index
    /// constraints.
    pub fn solve(&self, network: &Network) -> Result<Layout, MetroMapError> {
        info!("Solving layout");
        let layout = solve_layout(network, &self.config, &KktSolver)?;
        debug!(max_x = layout.max_x(), max_y = layout.max_y(); "Layout solved");
        Ok(layout)
    }

    /// Synthesize every curve of the network on a solved layout.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Consistency`] for cyclic curve dependencies
    /// and [`MetroMapError::Synthesis`] for curves that cannot be drawn.
    pub fn synthesize(
        &self,
        network: &Network,
        layout: &Layout,
        templates: &CurveTemplates,
    ) -> Result<CurvePaths, MetroMapError> {
        let fitter = SampledOffsetFitter::new(self.config.curves().offset_samples());
        synthesize_curves(network, layout, templates, &self.config, &fitter)
    }

    /// Assemble the map document.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Consistency`] for lines without a color and
    /// for unaligned edges without a curve.
    pub fn assemble(
        &self,
        network: &Network,
        layout: &Layout,
        paths: &CurvePaths,
        colors: &LineColors,
    ) -> Result<MapDocument, MetroMapError> {
        assemble_document(network, layout, paths, colors, &self.config)
    }

    /// Run the whole pipeline and return the map as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Config`] for an invalid configuration and
    /// the error of the first failing stage otherwise.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use metromap::{CurveTemplates, LineColors, MapBuilder, MapInputs, StationIdTable};
    ///
    /// let templates = std::fs::read_to_string("demos/data/templates.json").expect("read templates");
    /// let templates = CurveTemplates::from_json(&templates).expect("templates");
    /// let mut colors = LineColors::new();
    /// colors.insert("red", "#e1251b");
    /// let mut ids = StationIdTable::new();
    /// ids.insert("red", "A", "1");
    /// ids.insert("red", "B", "2");
    /// let inputs = MapInputs::new(ids, templates, colors);
    ///
    /// let source = "line red:\nstation \"A\" 0 0\nstation \"B\" 10 0\nedges \"A, B\"\n";
    /// let json = MapBuilder::default()
    ///     .render_json(source, &inputs)
    ///     .expect("Failed to build map");
    /// ```
    pub fn render_json(&self, source: &str, inputs: &MapInputs) -> Result<String, MetroMapError> {
        self.config.validate()?;

        let network = self.parse(source, inputs.station_ids())?;
        let layout = self.solve(&network)?;
        let paths = self.synthesize(&network, &layout, inputs.templates())?;
        let document = self.assemble(&network, &layout, &paths, inputs.colors())?;

        let json = document.to_json()?;
        info!(bytes = json.len(); "Map rendered successfully");
        Ok(json)
    }
}
