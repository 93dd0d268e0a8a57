//! Draw order of lines.

use log::debug;
use petgraph::{
    Direction,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
};

use metromap_core::network::{LineId, Network};

use crate::MetroMapError;

/// Assigns every line a z-index of at least 1 so that each line drawn
/// above another gets a strictly larger index.
///
/// Each line sits one layer above the highest line it must cover, which is
/// the longest path to it in the constraint graph.
pub(crate) fn solve_z_order(network: &Network) -> Result<Vec<u32>, MetroMapError> {
    let mut graph: DiGraph<LineId, ()> = DiGraph::with_capacity(network.line_count(), 0);
    let nodes: Vec<NodeIndex> = network.lines().map(|(id, _)| graph.add_node(id)).collect();

    for constraint in network.z_constraints() {
        graph.update_edge(
            nodes[constraint.below.index()],
            nodes[constraint.above.index()],
            (),
        );
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        let line = graph[cycle.node_id()];
        MetroMapError::Consistency(format!(
            "line `{}` is required to be drawn both above and below another line",
            network.line(line).name()
        ))
    })?;

    let mut z_indices = vec![1; network.line_count()];
    for node in order {
        let level = graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|below| z_indices[graph[below].index()] + 1)
            .max()
            .unwrap_or(1);
        z_indices[graph[node].index()] = level;
    }

    debug!(
        lines = z_indices.len(),
        layers = z_indices.iter().copied().max().unwrap_or(0);
        "Z order solved"
    );
    Ok(z_indices)
}

#[cfg(test)]
mod tests {
    use metromap_core::constraint::ZIndexConstraint;

    use super::*;

    fn network(lines: &[&str], above_below: &[(usize, usize)]) -> Network {
        let mut network = Network::new();
        let ids: Vec<LineId> = lines.iter().map(|name| network.add_line(name)).collect();
        for (above, below) in above_below {
            network.add_z_constraint(ZIndexConstraint {
                above: ids[*above],
                below: ids[*below],
                source_line: 1,
            });
        }
        network
    }

    #[test]
    fn test_unconstrained_lines_share_bottom_layer() {
        let z = solve_z_order(&network(&["a", "b"], &[])).unwrap();
        assert_eq!(z, vec![1, 1]);
    }

    #[test]
    fn test_chain_uses_longest_path() {
        // c above b, b above a, c above a
        let z = solve_z_order(&network(&["a", "b", "c"], &[(2, 1), (1, 0), (2, 0)])).unwrap();
        assert_eq!(z, vec![1, 2, 3]);
    }

    #[test]
    fn test_every_constraint_is_strict() {
        let constraints = [(0, 3), (1, 3), (2, 0), (2, 1), (4, 2)];
        let network = network(&["a", "b", "c", "d", "e"], &constraints);
        let z = solve_z_order(&network).unwrap();

        for (above, below) in constraints {
            assert!(z[above] > z[below], "{above} above {below}: {z:?}");
        }
        assert!(z.iter().all(|layer| *layer >= 1));
    }

    #[test]
    fn test_cycle_is_an_error() {
        let err = solve_z_order(&network(&["a", "b"], &[(0, 1), (1, 0)])).unwrap_err();
        assert!(matches!(err, MetroMapError::Consistency(_)));
    }

    #[test]
    fn test_self_constraint_is_a_cycle() {
        assert!(solve_z_order(&network(&["a"], &[(0, 0)])).is_err());
    }
}
