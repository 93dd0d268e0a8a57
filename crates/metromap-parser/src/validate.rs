//! Whole-network checks run after every reference is resolved.
//!
//! Unlike the parser, validation reports every finding at once.

use std::collections::HashSet;

use metromap_core::{
    curve::CurveShape,
    network::{CurveId, Network, StationId},
};

use crate::{
    error::{DiagnosticCollector, ErrorCode, ParseError},
    parser::SourceMap,
};

/// Checks station connectivity and curve references of a resolved network.
pub(crate) fn validate_network(network: &Network, source_map: &SourceMap) -> Result<(), ParseError> {
    let mut collector = DiagnosticCollector::new();
    check_orphans(network, source_map, &mut collector);
    check_curve_targets(network, source_map, &mut collector);
    collector.finish()
}

/// Every drawn station must be part of at least one edge.
fn check_orphans(network: &Network, source_map: &SourceMap, collector: &mut DiagnosticCollector) {
    let connected: HashSet<StationId> = network
        .lines()
        .flat_map(|(_, line)| line.edges())
        .flat_map(|edge| [edge.from(), edge.to()])
        .collect();

    for (id, station) in network.stations() {
        if station.is_alignment_point() || connected.contains(&id) {
            continue;
        }
        let origin = source_map.station(id);
        collector.emit(
            origin
                .error(
                    ErrorCode::E300,
                    origin.span,
                    format!(
                        "station `{}` is not connected to any other station on line `{}`",
                        station.name(),
                        network.line(station.line()).name()
                    ),
                )
                .with_help("add the station to an `edges` list"),
        );
    }
}

fn check_curve_targets(
    network: &Network,
    source_map: &SourceMap,
    collector: &mut DiagnosticCollector,
) {
    for (id, curve) in network.curves() {
        let origin = source_map.curve(id);
        match &curve.shape {
            CurveShape::ParallelTo { target, bend } => {
                if *target == id {
                    collector.emit(origin.error(
                        ErrorCode::E302,
                        origin.span,
                        "a curve cannot be parallel to itself",
                    ));
                    continue;
                }
                let target_bend = match network.curve(*target).shape.bend() {
                    Some(target_bend) => target_bend,
                    None => continue,
                };
                if target_bend != *bend {
                    collector.emit(
                        origin
                            .error(
                                ErrorCode::E301,
                                origin.span,
                                format!(
                                    "shape `{bend}` differs from the `{target_bend}` shape of the curve it follows"
                                ),
                            )
                            .with_secondary_label(source_map.curve(*target).span, "target declared here")
                            .with_help(format!("use `{target_bend}` for both curves")),
                    );
                }
            }
            CurveShape::SpecialJoin(parts) => {
                check_join_chain(network, source_map, collector, id, parts);
            }
            CurveShape::Sharp(_) | CurveShape::Wide(_) | CurveShape::SpecialSequence(_) => {}
        }
    }
}

/// Join parts must run end to end from the curve's first station to its last.
fn check_join_chain(
    network: &Network,
    source_map: &SourceMap,
    collector: &mut DiagnosticCollector,
    id: CurveId,
    parts: &[CurveId],
) {
    let origin = source_map.curve(id);
    let curve = network.curve(id);

    if parts.contains(&id) {
        collector.emit(origin.error(
            ErrorCode::E302,
            origin.span,
            "a joined curve cannot contain itself",
        ));
        return;
    }

    let mut expected = curve.from;
    for part in parts {
        let part_curve = network.curve(*part);
        if part_curve.from != expected {
            collector.emit(
                origin
                    .error(
                        ErrorCode::E302,
                        origin.span,
                        format!(
                            "joined curve `{}, {}` does not start at `{}`",
                            network.station(part_curve.from).name(),
                            network.station(part_curve.to).name(),
                            network.station(expected).name()
                        ),
                    )
                    .with_secondary_label(source_map.curve(*part).span, "part declared here"),
            );
            return;
        }
        expected = part_curve.to;
    }

    if expected != curve.to {
        collector.emit(origin.error(
            ErrorCode::E302,
            origin.span,
            format!(
                "joined curves end at `{}` instead of `{}`",
                network.station(expected).name(),
                network.station(curve.to).name()
            ),
        ));
    }
}
