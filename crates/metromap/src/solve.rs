//! Station placement and line draw order.
//!
//! [`solve_layout`] turns the author's approximate coordinates and
//! alignment constraints into exact integer positions, and the z-index
//! constraints into integer draw layers. The result is a [`Layout`], kept
//! apart from the parsed [`Network`] so that the network stays immutable.

mod equations;
mod integral;
mod lsq;
mod zorder;

pub use equations::LinearEquality;
pub use lsq::{EqualityLeastSquares, KktSolver, LeastSquaresProblem};

use log::{debug, info, trace};

use metromap_core::{
    geometry::Point,
    network::{LineId, Network, StationId},
};

use crate::{MetroMapError, config::AppConfig};

/// Solved station positions and line draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<Point>,
    z_indices: Vec<u32>,
}

impl Layout {
    /// Creates a layout from positions indexed by station and z-indices
    /// indexed by line.
    pub fn new(positions: Vec<Point>, z_indices: Vec<u32>) -> Self {
        Self {
            positions,
            z_indices,
        }
    }

    /// The solved, integral position of a station.
    pub fn position(&self, station: StationId) -> Point {
        self.positions[station.index()]
    }

    pub fn z_index(&self, line: LineId) -> u32 {
        self.z_indices[line.index()]
    }

    /// The largest solved X over all stations, or 0 without stations.
    pub fn max_x(&self) -> f64 {
        self.positions.iter().map(|p| p.x()).fold(0.0, f64::max)
    }

    /// The largest solved Y over all stations, or 0 without stations.
    pub fn max_y(&self) -> f64 {
        self.positions.iter().map(|p| p.y()).fold(0.0, f64::max)
    }
}

/// Solves station positions and z-indices.
///
/// # Errors
///
/// Returns [`MetroMapError::Solver`] when the alignment constraints
/// contradict each other and [`MetroMapError::Consistency`] when the
/// z-index constraints are cyclic.
pub fn solve_layout(
    network: &Network,
    config: &AppConfig,
    solver: &dyn EqualityLeastSquares,
) -> Result<Layout, MetroMapError> {
    let positions = solve_positions(network, config, solver)?;
    let z_indices = zorder::solve_z_order(network)?;
    Ok(Layout::new(positions, z_indices))
}

fn solve_positions(
    network: &Network,
    config: &AppConfig,
    solver: &dyn EqualityLeastSquares,
) -> Result<Vec<Point>, MetroMapError> {
    let line_width = f64::from(config.geometry().line_width());
    let alignment_weight = config.solver().alignment_point_weight();

    let mut targets = Vec::with_capacity(2 * network.station_count());
    let mut weights = Vec::with_capacity(2 * network.station_count());
    for (_, station) in network.stations() {
        let weight = if station.is_alignment_point() {
            alignment_weight
        } else {
            1.0
        };
        targets.extend([station.position().x(), station.position().y()]);
        weights.extend([weight, weight]);
    }

    let equalities = equations::build_equalities(network, line_width);
    info!(
        stations = network.station_count(),
        equalities = equalities.len();
        "Solving station positions"
    );

    let problem = LeastSquaresProblem::new(targets, weights, equalities)?;
    let solution = solver.solve_equality_lsq(&problem)?;
    let solution = integral::integral_solution(&solution, problem.equalities())?;

    let raw: Vec<Point> = network
        .stations()
        .map(|(id, _)| Point::new(solution[equations::x(id)], solution[equations::y(id)]))
        .collect();

    // Integral shifts keep every equality exact.
    let min_x = raw.iter().map(|p| p.x()).fold(f64::INFINITY, f64::min);
    let min_y = raw.iter().map(|p| p.y()).fold(f64::INFINITY, f64::min);
    debug!(min_x, min_y; "Translating solved positions to the origin");

    let positions = raw
        .into_iter()
        .map(|p| Point::new(p.x() - min_x, p.y() - min_y))
        .collect::<Vec<_>>();
    trace!(positions:?; "Solved positions");

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use metromap_core::{
        constraint::{
            AlignmentConstraint, Axis, Component, ConstraintKind, Diagonal, Relation, Term,
        },
        network::{Station, StationKind},
    };

    use super::*;

    fn station(network: &mut Network, line: LineId, name: &str, x: i64, y: i64) -> StationId {
        network.add_station(Station::new(
            name,
            line,
            StationKind::Station,
            name,
            Point::from_grid(x, y),
        ))
    }

    fn constrain(network: &mut Network, kind: ConstraintKind) {
        network.add_alignment_constraint(AlignmentConstraint {
            kind,
            line: None,
            source_line: 1,
            text: String::new(),
        });
    }

    fn solve(network: &Network) -> Layout {
        solve_layout(network, &AppConfig::default(), &KktSolver).unwrap()
    }

    #[test]
    fn test_aligned_input_is_kept() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let a = station(&mut network, red, "A", 0, 0);
        let b = station(&mut network, red, "B", 100, 0);
        network.add_edge(red, a, b);

        let layout = solve(&network);
        assert_eq!(layout.position(a), Point::new(0.0, 0.0));
        assert_eq!(layout.position(b), Point::new(100.0, 0.0));
        assert_eq!(layout.z_index(red), 1);
    }

    #[test]
    fn test_translated_to_origin() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let a = station(&mut network, red, "A", -40, 30);
        let b = station(&mut network, red, "B", 60, 90);

        let layout = solve(&network);
        assert_eq!(layout.position(a), Point::new(0.0, 0.0));
        assert_eq!(layout.position(b), Point::new(100.0, 60.0));
        assert_eq!(layout.max_x(), 100.0);
        assert_eq!(layout.max_y(), 60.0);
    }

    #[test]
    fn test_vertical_is_exact() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let a = station(&mut network, red, "A", 0, 0);
        let b = station(&mut network, red, "B", 7, 100);
        let c = station(&mut network, red, "C", 3, 200);
        constrain(
            &mut network,
            ConstraintKind::Axis {
                axis: Axis::Vertical,
                stations: vec![a, b, c],
            },
        );

        let layout = solve(&network);
        assert_eq!(layout.position(a).x(), layout.position(b).x());
        assert_eq!(layout.position(b).x(), layout.position(c).x());
    }

    #[test]
    fn test_same_station_offset_by_line_width() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let blue = network.add_line("blue");
        let a = station(&mut network, red, "A", 100, 100);
        let b = station(&mut network, blue, "A", 100, 100);
        constrain(
            &mut network,
            ConstraintKind::SameStation {
                relation: Relation::Left,
                pairs: vec![(a, b)],
            },
        );

        let layout = solve(&network);
        assert_eq!(layout.position(b).x() - layout.position(a).x(), 50.0);
        assert_eq!(layout.position(a).y(), layout.position(b).y());
    }

    #[test]
    fn test_diagonal_is_exact_off_grid() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let a = station(&mut network, red, "A", 0, 0);
        let b = station(&mut network, red, "B", 103, 100);
        constrain(
            &mut network,
            ConstraintKind::Diagonal {
                diagonal: Diagonal::Falling,
                stations: vec![a, b],
            },
        );

        let layout = solve(&network);
        let (pa, pb) = (layout.position(a), layout.position(b));
        assert_eq!(pb.x() - pa.x(), pb.y() - pa.y());
        for p in [pa, pb] {
            assert_eq!(p.x().fract(), 0.0);
            assert_eq!(p.y().fract(), 0.0);
        }
    }

    #[test]
    fn test_same_station_on_a_diagonal_is_exact() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let blue = network.add_line("blue");
        let a = station(&mut network, red, "A", 0, 0);
        let b = station(&mut network, red, "B", 101, 98);
        let shadow = station(&mut network, blue, "B", 140, 61);
        constrain(
            &mut network,
            ConstraintKind::Diagonal {
                diagonal: Diagonal::Falling,
                stations: vec![a, b],
            },
        );
        constrain(
            &mut network,
            ConstraintKind::SameStation {
                relation: Relation::AboveRight,
                pairs: vec![(b, shadow)],
            },
        );

        let layout = solve(&network);
        let (pa, pb, ps) = (layout.position(a), layout.position(b), layout.position(shadow));
        assert_eq!(pb.x() - pa.x(), pb.y() - pa.y());
        assert_eq!((ps.x() - pb.x()).abs(), 35.0);
        assert_eq!((ps.y() - pb.y()).abs(), 35.0);
    }

    #[test]
    fn test_linear_equal_is_exact_off_grid() {
        let mut network = Network::new();
        let red = network.add_line("red");
        let a = station(&mut network, red, "A", 0, 0);
        let b = station(&mut network, red, "B", 50, 0);
        let c = station(&mut network, red, "C", 101, 0);
        let x = |station| Term {
            station,
            component: Component::X,
        };
        constrain(
            &mut network,
            ConstraintKind::LinearEqual {
                lhs: vec![x(a), x(c)],
                rhs: vec![x(b), x(b)],
            },
        );

        let layout = solve(&network);
        let (pa, pb, pc) = (layout.position(a), layout.position(b), layout.position(c));
        assert_eq!(pa.x() + pc.x(), 2.0 * pb.x());
        assert_eq!(pb.x().fract(), 0.0);
    }
}
