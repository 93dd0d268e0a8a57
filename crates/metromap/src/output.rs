//! The renderable map document.
//!
//! [`assemble_document`] combines the network, its solved layout and the
//! synthesized curves into a [`MapDocument`], the JSON structure consumed
//! by map renderers. Coordinates in the document are integers.

use std::{collections::HashMap, f64::consts::SQRT_2};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use metromap_core::{
    direction::Direction,
    endpoint::Endpoint,
    geometry::Point,
    network::{LineId, MetroLine, Network, StationId},
    segment::LineSegment,
};

use crate::{MetroMapError, config::AppConfig, curves::CurvePaths, solve::Layout};

/// Display colors of lines, by line name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineColors {
    colors: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ColorEntry {
    name: String,
    color: String,
}

impl LineColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a color file: a JSON array of `{"name", "color"}` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<ColorEntry> = serde_json::from_str(json)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.name, entry.color))
            .collect())
    }

    pub fn insert(&mut self, line: impl Into<String>, color: impl Into<String>) {
        self.colors.insert(line.into(), color.into());
    }

    pub fn color(&self, line: &str) -> Option<&str> {
        self.colors.get(line).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for LineColors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            colors: iter.into_iter().collect(),
        }
    }
}

/// A point of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl From<Point> for GridPoint {
    fn from(point: Point) -> Self {
        let (x, y) = point.to_grid();
        Self { x, y }
    }
}

/// One drawn segment. Straight segments have only `p0` and `p1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDocument {
    pub straight: bool,
    pub p0: GridPoint,
    pub p1: GridPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p2: Option<GridPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p3: Option<GridPoint>,
}

impl From<&LineSegment> for SegmentDocument {
    fn from(segment: &LineSegment) -> Self {
        match segment {
            LineSegment::Straight { p0, p1 } => Self::straight(*p0, *p1),
            LineSegment::Bezier(curve) => Self {
                straight: false,
                p0: curve.p0().into(),
                p1: curve.p1().into(),
                p2: Some(curve.p2().into()),
                p3: Some(curve.p3().into()),
            },
        }
    }
}

impl SegmentDocument {
    fn straight(p0: Point, p1: Point) -> Self {
        Self {
            straight: true,
            p0: p0.into(),
            p1: p1.into(),
            p2: None,
            p3: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDocument {
    pub id: String,
    pub name: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub station1_id: String,
    pub station2_id: String,
    pub segments: Vec<SegmentDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDocument {
    pub name: String,
    pub color: String,
    pub z_index: u32,
    pub stations: Vec<StationDocument>,
    pub edges: Vec<EdgeDocument>,
    pub endpoint_segments: Vec<SegmentDocument>,
}

/// The whole map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    pub line_width: u32,
    pub max_x: i64,
    pub max_y: i64,
    pub lines: Vec<LineDocument>,
}

impl MapDocument {
    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, MetroMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds the map document.
///
/// Lines, stations and edges appear in declaration order. Alignment points
/// are left out. An edge with a curve takes the curve's path and is
/// oriented like the curve; any other edge is one straight segment.
///
/// # Errors
///
/// Returns [`MetroMapError::Consistency`] when `paths` were synthesized for
/// a different network, when a line has no color or when an edge without a
/// curve joins stations that are not on a common horizontal, vertical or
/// diagonal.
pub fn assemble_document(
    network: &Network,
    layout: &Layout,
    paths: &CurvePaths,
    colors: &LineColors,
    config: &AppConfig,
) -> Result<MapDocument, MetroMapError> {
    if paths.len() != network.curve_count() {
        return Err(MetroMapError::Consistency(format!(
            "{} curve paths given for {} curves",
            paths.len(),
            network.curve_count()
        )));
    }

    let line_width = config.geometry().line_width();
    let width = f64::from(line_width);
    info!(lines = network.line_count(); "Assembling map document");

    let lines = network
        .lines()
        .map(|(id, line)| -> Result<LineDocument, MetroMapError> {
            let color = colors.color(line.name()).ok_or_else(|| {
                MetroMapError::Consistency(format!("no color is given for line `{}`", line.name()))
            })?;
            let assembler = LineAssembler {
                network,
                layout,
                paths,
                id,
                line,
            };
            Ok(LineDocument {
                name: line.name().to_string(),
                color: color.to_string(),
                z_index: layout.z_index(id),
                stations: assembler.stations(),
                edges: assembler.edges()?,
                endpoint_segments: assembler
                    .endpoints(width * config.endpoint().length_factor() / 2.0),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (max_x, max_y) = Point::new(layout.max_x() + width, layout.max_y() + width).to_grid();
    debug!(max_x, max_y; "Map extent");

    Ok(MapDocument {
        line_width,
        max_x,
        max_y,
        lines,
    })
}

struct LineAssembler<'a> {
    network: &'a Network,
    layout: &'a Layout,
    paths: &'a CurvePaths,
    id: LineId,
    line: &'a MetroLine,
}

impl LineAssembler<'_> {
    fn stations(&self) -> Vec<StationDocument> {
        self.line
            .stations()
            .values()
            .map(|id| (*id, self.network.station(*id)))
            .filter(|(_, station)| !station.is_alignment_point())
            .map(|(id, station)| {
                let (x, y) = self.layout.position(id).to_grid();
                StationDocument {
                    id: station.external_id().to_string(),
                    name: station.name().to_string(),
                    x,
                    y,
                }
            })
            .collect()
    }

    fn edges(&self) -> Result<Vec<EdgeDocument>, MetroMapError> {
        self.line
            .edges()
            .map(|edge| match self.network.curve_between(self.id, edge.from(), edge.to()) {
                Some(curve_id) => {
                    let curve = self.network.curve(curve_id);
                    Ok(self.edge(
                        curve.from,
                        curve.to,
                        self.paths.path(curve_id).iter().map(SegmentDocument::from).collect(),
                    ))
                }
                None => {
                    let (a, b) = (edge.from(), edge.to());
                    self.check_aligned(a, b)?;
                    let segment =
                        SegmentDocument::straight(self.layout.position(a), self.layout.position(b));
                    Ok(self.edge(a, b, vec![segment]))
                }
            })
            .collect()
    }

    fn edge(&self, a: StationId, b: StationId, segments: Vec<SegmentDocument>) -> EdgeDocument {
        EdgeDocument {
            station1_id: self.network.station(a).external_id().to_string(),
            station2_id: self.network.station(b).external_id().to_string(),
            segments,
        }
    }

    fn check_aligned(&self, a: StationId, b: StationId) -> Result<(), MetroMapError> {
        let (pa, pb) = (self.layout.position(a), self.layout.position(b));
        let (dx, dy) = (pb.x() - pa.x(), pb.y() - pa.y());
        if dx == 0.0 || dy == 0.0 || dx.abs() == dy.abs() {
            return Ok(());
        }
        Err(MetroMapError::Consistency(format!(
            "Stations {} and {} on line {} are not aligned, but do not have a curve specified.",
            self.network.station(a).name(),
            self.network.station(b).name(),
            self.line.name()
        )))
    }

    /// Endpoint bars `2 * half_length` long, measured along the bar.
    fn endpoints(&self, half_length: f64) -> Vec<SegmentDocument> {
        self.line
            .endpoints()
            .iter()
            .map(|endpoint| {
                endpoint_segment(endpoint, self.layout.position(endpoint.station), half_length)
            })
            .collect()
    }
}

fn endpoint_segment(endpoint: &Endpoint, station: Point, half_length: f64) -> SegmentDocument {
    let (toward_p0, toward_p1) = endpoint.axis.directions();
    let reach = |direction: Direction| {
        let extent = if direction.is_diagonal() {
            (half_length / SQRT_2).round()
        } else {
            half_length.round()
        };
        let (dx, dy) = direction.step();
        station.add_point(Point::from_grid(dx, dy).scale(extent))
    };

    let (p0, p1) = match endpoint.half {
        Some(half) if half == toward_p0 => (reach(toward_p0), station),
        Some(half) if half == toward_p1 => (station, reach(toward_p1)),
        _ => (reach(toward_p0), reach(toward_p1)),
    };
    SegmentDocument::straight(p0, p1)
}

#[cfg(test)]
mod tests {
    use metromap_core::{
        curve::{Bend, Curve, CurveShape},
        endpoint::EndpointAxis,
        network::{Station, StationKind},
    };

    use super::*;
    use crate::curves::{CurveTemplate, CurveTemplates, SampledOffsetFitter, synthesize_curves};

    fn templates() -> CurveTemplates {
        CurveTemplates::new(
            CurveTemplate::new(
                [
                    Point::new(-8.0, 0.0),
                    Point::new(-3.5, 0.0),
                    Point::new(0.0, 3.5),
                    Point::new(0.0, 8.0),
                ],
                1.0,
            ),
            CurveTemplate::new(
                [
                    Point::new(-6.0, 0.0),
                    Point::new(-2.0, 0.0),
                    Point::new(1.5, 1.5),
                    Point::new(4.5, 4.5),
                ],
                1.0,
            ),
        )
    }

    fn red() -> LineColors {
        [("red".to_string(), "#ff0000".to_string())].into_iter().collect()
    }

    struct Map {
        network: Network,
        line: LineId,
        positions: Vec<Point>,
    }

    impl Map {
        fn new() -> Self {
            let mut network = Network::new();
            let line = network.add_line("red");
            Self {
                network,
                line,
                positions: Vec::new(),
            }
        }

        fn station(&mut self, name: &str, kind: StationKind, x: i64, y: i64) -> StationId {
            self.positions.push(Point::from_grid(x, y));
            self.network.add_station(Station::new(
                name,
                self.line,
                kind,
                format!("id-{name}"),
                Point::from_grid(x, y),
            ))
        }

        fn assemble(&self, colors: &LineColors) -> Result<MapDocument, MetroMapError> {
            let config = AppConfig::default();
            let layout = Layout::new(self.positions.clone(), vec![1]);
            let paths = synthesize_curves(
                &self.network,
                &layout,
                &templates(),
                &config,
                &SampledOffsetFitter::default(),
            )?;
            assemble_document(&self.network, &layout, &paths, colors, &config)
        }
    }

    #[test]
    fn test_straight_edge_and_extent() {
        let mut map = Map::new();
        let a = map.station("A", StationKind::Station, 0, 0);
        let b = map.station("B", StationKind::Station, 100, 100);
        map.network.add_edge(map.line, a, b);

        let document = map.assemble(&red()).unwrap();

        assert_eq!(document.line_width, 50);
        assert_eq!((document.max_x, document.max_y), (150, 150));
        let line = &document.lines[0];
        assert_eq!(line.color, "#ff0000");
        assert_eq!(line.z_index, 1);
        assert_eq!(line.edges.len(), 1);
        assert_eq!(line.edges[0].station1_id, "id-A");
        assert!(line.edges[0].segments[0].straight);
    }

    #[test]
    fn test_unaligned_edge_without_curve_is_an_error() {
        let mut map = Map::new();
        let a = map.station("A", StationKind::Station, 0, 0);
        let b = map.station("B", StationKind::Station, 100, 40);
        map.network.add_edge(map.line, a, b);

        let err = map.assemble(&red()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Consistency error: Stations A and B on line red are not aligned, \
             but do not have a curve specified."
        );
    }

    #[test]
    fn test_curve_edge_is_oriented_like_the_curve() {
        let mut map = Map::new();
        let a = map.station("A", StationKind::Station, 0, 0);
        let b = map.station("B", StationKind::Station, 200, 200);
        map.network.add_edge(map.line, a, b);
        map.network.add_curve(Curve {
            line: map.line,
            from: b,
            to: a,
            shape: CurveShape::Sharp(Bend::new(Direction::Up, Direction::Left)),
            source_line: 3,
        });

        let document = map.assemble(&red()).unwrap();
        let edge = &document.lines[0].edges[0];

        assert_eq!(edge.station1_id, "id-B");
        assert_eq!(edge.station2_id, "id-A");
        assert!(edge.segments.iter().any(|segment| !segment.straight));
        assert_eq!(edge.segments[0].p0, GridPoint { x: 200, y: 200 });
    }

    #[test]
    fn test_alignment_points_are_not_listed() {
        let mut map = Map::new();
        map.station("A", StationKind::Station, 0, 0);
        map.station("p", StationKind::AlignmentPoint, 50, 50);

        let document = map.assemble(&red()).unwrap();
        let names: Vec<&str> = document.lines[0]
            .stations
            .iter()
            .map(|station| station.name.as_str())
            .collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn test_stale_paths_are_rejected() {
        let mut map = Map::new();
        let a = map.station("A", StationKind::Station, 0, 0);
        let b = map.station("B", StationKind::Station, 200, 200);
        map.network.add_edge(map.line, a, b);

        let config = AppConfig::default();
        let layout = Layout::new(map.positions.clone(), vec![1]);
        let paths = synthesize_curves(
            &map.network,
            &layout,
            &templates(),
            &config,
            &SampledOffsetFitter::default(),
        )
        .unwrap();
        map.network.add_curve(Curve {
            line: map.line,
            from: b,
            to: a,
            shape: CurveShape::Sharp(Bend::new(Direction::Up, Direction::Left)),
            source_line: 3,
        });

        let err = assemble_document(&map.network, &layout, &paths, &red(), &config).unwrap_err();
        assert!(matches!(err, MetroMapError::Consistency(_)));
    }

    #[test]
    fn test_missing_color_is_an_error() {
        let map = Map::new();
        assert!(matches!(
            map.assemble(&LineColors::new()),
            Err(MetroMapError::Consistency(_))
        ));
    }

    #[test]
    fn test_endpoint_bars() {
        let station = Point::new(100.0, 100.0);
        let bar = |axis, half| {
            endpoint_segment(
                &Endpoint {
                    station: StationId::new(0),
                    axis,
                    half,
                    source_line: 1,
                },
                station,
                75.0,
            )
        };

        let horizontal = bar(EndpointAxis::Horizontal, None);
        assert_eq!(horizontal.p0, GridPoint { x: 25, y: 100 });
        assert_eq!(horizontal.p1, GridPoint { x: 175, y: 100 });

        let falling = bar(EndpointAxis::Falling, None);
        assert_eq!(falling.p0, GridPoint { x: 47, y: 47 });
        assert_eq!(falling.p1, GridPoint { x: 153, y: 153 });

        let lower_half = bar(EndpointAxis::Vertical, Some(Direction::Down));
        assert_eq!(lower_half.p0, GridPoint { x: 100, y: 100 });
        assert_eq!(lower_half.p1, GridPoint { x: 100, y: 175 });
    }

    #[test]
    fn test_json_field_names() {
        let mut map = Map::new();
        map.station("A", StationKind::Station, 0, 0);

        let json = map.assemble(&red()).unwrap().to_json().unwrap();
        for field in ["\"lineWidth\"", "\"maxX\"", "\"zIndex\"", "\"endpointSegments\""] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
        assert!(!json.contains("\"p2\""));
    }

    #[test]
    fn test_color_file() {
        let colors = LineColors::from_json(r##"[{"name": "red", "color": "#f00"}]"##).unwrap();
        assert_eq!(colors.color("red"), Some("#f00"));
        assert_eq!(colors.color("blue"), None);
    }
}
