//! Synthesis order of curves that depend on other curves.

use std::collections::VecDeque;

use log::debug;
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use metromap_core::network::{CurveId, Network};

use crate::MetroMapError;

/// Orders curves so that every curve comes after the curves it is drawn
/// from (the target of a parallel curve, the parts of a join).
///
/// Independent curves keep declaration order.
///
/// # Errors
///
/// Returns [`MetroMapError::Consistency`] naming the curves that depend on
/// each other in a cycle.
pub(crate) fn synthesis_order(network: &Network) -> Result<Vec<CurveId>, MetroMapError> {
    let mut graph: DiGraph<CurveId, ()> = DiGraph::with_capacity(network.curve_count(), 0);
    let nodes: Vec<NodeIndex> = network.curves().map(|(id, _)| graph.add_node(id)).collect();

    for (id, curve) in network.curves() {
        for dependency in curve.shape.dependencies() {
            graph.add_edge(nodes[dependency.index()], nodes[id.index()], ());
        }
    }

    let mut pending: Vec<usize> = nodes
        .iter()
        .map(|node| graph.neighbors_directed(*node, Direction::Incoming).count())
        .collect();
    let mut ready: VecDeque<NodeIndex> = nodes
        .iter()
        .copied()
        .filter(|node| pending[node.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop_front() {
        order.push(graph[node]);
        for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
            pending[dependent.index()] -= 1;
            if pending[dependent.index()] == 0 {
                ready.push_back(dependent);
            }
        }
    }

    if order.len() < nodes.len() {
        let stuck: Vec<String> = nodes
            .iter()
            .filter(|node| pending[node.index()] > 0)
            .map(|node| describe(network, graph[*node]))
            .collect();
        return Err(MetroMapError::Consistency(format!(
            "curves depend on each other in a cycle: {}",
            stuck.join(", ")
        )));
    }

    debug!(curves = order.len(); "Curve synthesis order resolved");
    Ok(order)
}

/// A curve as the author wrote it, for error messages.
pub(crate) fn describe(network: &Network, id: CurveId) -> String {
    let curve = network.curve(id);
    format!(
        "curve `{}` to `{}` (line {})",
        network.qualified_name(curve.from),
        network.station(curve.to).name(),
        curve.source_line
    )
}

#[cfg(test)]
mod tests {
    use metromap_core::{
        curve::{Bend, Curve, CurveShape},
        direction::Direction as Heading,
        geometry::Point,
        network::{LineId, Station, StationId, StationKind},
    };

    use super::*;

    fn bend() -> Bend {
        Bend::new(Heading::Right, Heading::Down)
    }

    fn network_with_stations() -> (Network, LineId, Vec<StationId>) {
        let mut network = Network::new();
        let line = network.add_line("red");
        let stations = ["A", "B", "C", "D"]
            .into_iter()
            .map(|name| {
                network.add_station(Station::new(
                    name,
                    line,
                    StationKind::Station,
                    name,
                    Point::default(),
                ))
            })
            .collect();
        (network, line, stations)
    }

    fn add(network: &mut Network, line: LineId, from: StationId, to: StationId, shape: CurveShape) -> CurveId {
        network.add_curve(Curve {
            line,
            from,
            to,
            shape,
            source_line: 1,
        })
    }

    #[test]
    fn test_dependencies_come_first() {
        let (mut network, line, s) = network_with_stations();
        let parallel_target = CurveId::new(1);
        let parallel = add(
            &mut network,
            line,
            s[0],
            s[1],
            CurveShape::ParallelTo {
                target: parallel_target,
                bend: bend(),
            },
        );
        let target = add(&mut network, line, s[2], s[3], CurveShape::Sharp(bend()));
        assert_eq!(target, parallel_target);

        let order = synthesis_order(&network).unwrap();
        assert_eq!(order, vec![target, parallel]);
    }

    #[test]
    fn test_independent_curves_keep_declaration_order() {
        let (mut network, line, s) = network_with_stations();
        let first = add(&mut network, line, s[0], s[1], CurveShape::Sharp(bend()));
        let second = add(&mut network, line, s[2], s[3], CurveShape::Wide(bend()));

        assert_eq!(synthesis_order(&network).unwrap(), vec![first, second]);
    }

    #[test]
    fn test_cycle_names_curves() {
        let (mut network, line, s) = network_with_stations();
        add(
            &mut network,
            line,
            s[0],
            s[1],
            CurveShape::ParallelTo {
                target: CurveId::new(1),
                bend: bend(),
            },
        );
        add(
            &mut network,
            line,
            s[2],
            s[3],
            CurveShape::ParallelTo {
                target: CurveId::new(0),
                bend: bend(),
            },
        );

        let err = synthesis_order(&network).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("red: A"), "{message}");
        assert!(message.contains("red: C"), "{message}");
    }
}
