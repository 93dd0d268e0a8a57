//! The parsed metro network.
//!
//! [`Network`] is an arena owning every line, station, curve and constraint
//! declared in a network file. Elements refer to each other through typed
//! indices ([`LineId`], [`StationId`], [`CurveId`]), so the whole model is
//! immutable once parsing has finished. Solved positions and draw order are
//! produced later as separate values.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use indexmap::{IndexMap, IndexSet};

use crate::{
    constraint::{AlignmentConstraint, ZIndexConstraint},
    curve::Curve,
    endpoint::Endpoint,
    geometry::Point,
};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`MetroLine`] in its [`Network`].
    LineId
);
arena_id!(
    /// Index of a [`Station`] in its [`Network`].
    StationId
);
arena_id!(
    /// Index of a [`Curve`] in its [`Network`].
    CurveId
);

/// Whether a station is drawn or only pins geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    Station,
    AlignmentPoint,
}

/// A station or alignment point on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    name: String,
    line: LineId,
    kind: StationKind,
    external_id: String,
    position: Point,
}

impl Station {
    pub fn new(
        name: impl Into<String>,
        line: LineId,
        kind: StationKind,
        external_id: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            name: name.into(),
            line,
            kind,
            external_id: external_id.into(),
            position,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn kind(&self) -> StationKind {
        self.kind
    }

    pub fn is_alignment_point(&self) -> bool {
        self.kind == StationKind::AlignmentPoint
    }

    /// Identifier used for this station in the output document.
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// The approximate position sketched by the author.
    pub fn position(&self) -> Point {
        self.position
    }
}

/// An undirected connection between two stations of a line.
///
/// `Edge::new(a, b)` and `Edge::new(b, a)` compare and hash equal; the
/// declared orientation is kept for output.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    from: StationId,
    to: StationId,
}

impl Edge {
    pub fn new(from: StationId, to: StationId) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> StationId {
        self.from
    }

    pub fn to(&self) -> StationId {
        self.to
    }

    pub fn connects(&self, a: StationId, b: StationId) -> bool {
        self.key() == Edge::new(a, b).key()
    }

    fn key(&self) -> (StationId, StationId) {
        if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// A named metro line with its stations, edges, curves and endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct MetroLine {
    name: String,
    stations: IndexMap<String, StationId>,
    edges: IndexSet<Edge>,
    curves: Vec<CurveId>,
    endpoints: Vec<Endpoint>,
}

impl MetroLine {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stations: IndexMap::new(),
            edges: IndexSet::new(),
            curves: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stations in declaration order, keyed by local name.
    pub fn stations(&self) -> &IndexMap<String, StationId> {
        &self.stations
    }

    pub fn station(&self, name: &str) -> Option<StationId> {
        self.stations.get(name).copied()
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn has_edge(&self, a: StationId, b: StationId) -> bool {
        self.edges.contains(&Edge::new(a, b))
    }

    /// Curves of this line in declaration order.
    pub fn curves(&self) -> &[CurveId] {
        &self.curves
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

/// The complete parsed network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    lines: Vec<MetroLine>,
    line_names: IndexMap<String, LineId>,
    stations: Vec<Station>,
    curves: Vec<Curve>,
    alignment_constraints: Vec<AlignmentConstraint>,
    z_constraints: Vec<ZIndexConstraint>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line, returning the existing id if the name is taken.
    pub fn add_line(&mut self, name: &str) -> LineId {
        if let Some(id) = self.line_names.get(name) {
            return *id;
        }
        let id = LineId::new(self.lines.len());
        self.lines.push(MetroLine::new(name));
        self.line_names.insert(name.to_string(), id);
        id
    }

    /// Adds a station to its line.
    pub fn add_station(&mut self, station: Station) -> StationId {
        let id = StationId::new(self.stations.len());
        self.lines[station.line.index()]
            .stations
            .insert(station.name.clone(), id);
        self.stations.push(station);
        id
    }

    /// Adds an edge; returns `false` if the pair was already connected.
    pub fn add_edge(&mut self, line: LineId, a: StationId, b: StationId) -> bool {
        self.lines[line.index()].edges.insert(Edge::new(a, b))
    }

    /// Adds a curve to the arena and to its line.
    pub fn add_curve(&mut self, curve: Curve) -> CurveId {
        let id = CurveId::new(self.curves.len());
        self.lines[curve.line.index()].curves.push(id);
        self.curves.push(curve);
        id
    }

    pub fn add_endpoint(&mut self, line: LineId, endpoint: Endpoint) {
        self.lines[line.index()].endpoints.push(endpoint);
    }

    pub fn add_alignment_constraint(&mut self, constraint: AlignmentConstraint) {
        self.alignment_constraints.push(constraint);
    }

    pub fn add_z_constraint(&mut self, constraint: ZIndexConstraint) {
        self.z_constraints.push(constraint);
    }

    pub fn line_id(&self, name: &str) -> Option<LineId> {
        self.line_names.get(name).copied()
    }

    pub fn line(&self, id: LineId) -> &MetroLine {
        &self.lines[id.index()]
    }

    /// Lines in declaration order.
    pub fn lines(&self) -> impl Iterator<Item = (LineId, &MetroLine)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| (LineId::new(index), line))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.index()]
    }

    /// Looks up a station by line and local name.
    pub fn station_id(&self, line: LineId, name: &str) -> Option<StationId> {
        self.line(line).station(name)
    }

    /// All stations in declaration order.
    pub fn stations(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.stations
            .iter()
            .enumerate()
            .map(|(index, station)| (StationId::new(index), station))
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// `line: station` form of a station name, for messages.
    pub fn qualified_name(&self, id: StationId) -> String {
        let station = self.station(id);
        format!("{}: {}", self.line(station.line).name, station.name)
    }

    pub fn curve(&self, id: CurveId) -> &Curve {
        &self.curves[id.index()]
    }

    /// All curves in declaration order.
    pub fn curves(&self) -> impl Iterator<Item = (CurveId, &Curve)> {
        self.curves
            .iter()
            .enumerate()
            .map(|(index, curve)| (CurveId::new(index), curve))
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Finds the curve joining `a` and `b` on `line`, in either direction.
    pub fn curve_between(&self, line: LineId, a: StationId, b: StationId) -> Option<CurveId> {
        self.line(line).curves.iter().copied().find(|id| {
            let curve = self.curve(*id);
            (curve.from == a && curve.to == b) || (curve.from == b && curve.to == a)
        })
    }

    pub fn alignment_constraints(&self) -> &[AlignmentConstraint] {
        &self.alignment_constraints
    }

    pub fn z_constraints(&self) -> &[ZIndexConstraint] {
        &self.z_constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Bend, CurveShape};
    use crate::direction::Direction;

    fn two_station_network() -> (Network, LineId, StationId, StationId) {
        let mut network = Network::new();
        let line = network.add_line("red");
        let a = network.add_station(Station::new(
            "A",
            line,
            StationKind::Station,
            "940A",
            Point::new(0.0, 0.0),
        ));
        let b = network.add_station(Station::new(
            "B",
            line,
            StationKind::Station,
            "940B",
            Point::new(100.0, 0.0),
        ));
        (network, line, a, b)
    }

    #[test]
    fn test_edges_are_undirected() {
        let (mut network, line, a, b) = two_station_network();

        assert!(network.add_edge(line, a, b));
        assert!(!network.add_edge(line, b, a));
        assert!(network.line(line).has_edge(b, a));
        assert_eq!(network.line(line).edges().count(), 1);
    }

    #[test]
    fn test_lookup_by_name() {
        let (network, line, a, _) = two_station_network();

        assert_eq!(network.line_id("red"), Some(line));
        assert_eq!(network.line_id("blue"), None);
        assert_eq!(network.station_id(line, "A"), Some(a));
        assert_eq!(network.qualified_name(a), "red: A");
    }

    #[test]
    fn test_add_line_is_idempotent() {
        let mut network = Network::new();
        let first = network.add_line("red");
        let second = network.add_line("red");
        assert_eq!(first, second);
        assert_eq!(network.line_count(), 1);
    }

    #[test]
    fn test_curve_between_either_direction() {
        let (mut network, line, a, b) = two_station_network();
        let id = network.add_curve(Curve {
            line,
            from: a,
            to: b,
            shape: CurveShape::Sharp(Bend::new(Direction::Right, Direction::Down)),
            source_line: 4,
        });

        assert_eq!(network.curve_between(line, a, b), Some(id));
        assert_eq!(network.curve_between(line, b, a), Some(id));
        assert_eq!(network.line(line).curves(), &[id]);
    }
}
