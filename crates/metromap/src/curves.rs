//! Curve synthesis.
//!
//! Every declared curve becomes a path of straight and cubic Bezier
//! segments between its two solved station positions. Template curves are
//! drawn from the sharp and wide templates, sequences chain template curves
//! through intermediate stations, joins concatenate other curves and
//! parallel curves are offset from their target. Curves are synthesized
//! after the curves they depend on.

mod canonical;
mod draw;
mod order;
mod parallel;
mod templates;

pub use parallel::{OffsetCurveFitter, SampledOffsetFitter};
pub use templates::{CurveTemplate, CurveTemplates};

use log::{debug, info, trace};

use metromap_core::{
    curve::CurveShape,
    network::{CurveId, Network},
    segment::LineSegment,
};

use crate::{MetroMapError, config::AppConfig, solve::Layout};

use templates::ScaledTemplates;

/// The synthesized path of every curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePaths {
    paths: Vec<Vec<LineSegment>>,
}

impl CurvePaths {
    /// The path of a curve, running from its `from` station to its `to`
    /// station.
    pub fn path(&self, curve: CurveId) -> &[LineSegment] {
        &self.paths[curve.index()]
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Synthesizes the path of every curve in the network.
///
/// # Errors
///
/// Returns [`MetroMapError::Consistency`] when curves depend on each other
/// in a cycle and [`MetroMapError::Synthesis`] when a curve cannot be drawn
/// between its solved stations.
pub fn synthesize_curves(
    network: &Network,
    layout: &Layout,
    templates: &CurveTemplates,
    config: &AppConfig,
    fitter: &dyn OffsetCurveFitter,
) -> Result<CurvePaths, MetroMapError> {
    let order = order::synthesis_order(network)?;
    info!(curves = order.len(); "Synthesizing curves");

    let synthesizer = Synthesizer {
        network,
        layout,
        templates: templates.scaled(config.geometry().scale_factor()),
        line_width: f64::from(config.geometry().line_width()),
        fitter,
    };

    let mut paths: Vec<Option<Vec<LineSegment>>> = vec![None; network.curve_count()];
    for id in order {
        let path = synthesizer.synthesize(id, &paths)?;
        trace!(curve = id.index(), segments = path.len(); "Curve synthesized");
        paths[id.index()] = Some(path);
    }

    let paths = paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            path.ok_or_else(|| {
                MetroMapError::Synthesis(format!(
                    "{} was never synthesized",
                    order::describe(network, CurveId::new(index))
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(curves = paths.len(); "Curve synthesis complete");
    Ok(CurvePaths { paths })
}

struct Synthesizer<'a> {
    network: &'a Network,
    layout: &'a Layout,
    templates: ScaledTemplates,
    line_width: f64,
    fitter: &'a dyn OffsetCurveFitter,
}

impl Synthesizer<'_> {
    fn synthesize(
        &self,
        id: CurveId,
        done: &[Option<Vec<LineSegment>>],
    ) -> Result<Vec<LineSegment>, MetroMapError> {
        let curve = self.network.curve(id);
        let from = self.layout.position(curve.from);
        let to = self.layout.position(curve.to);
        let failed = |reason: String| {
            MetroMapError::Synthesis(format!("{}: {reason}", order::describe(self.network, id)))
        };

        match &curve.shape {
            CurveShape::Sharp(bend) | CurveShape::Wide(bend) => {
                draw::bend_path(*bend, from, to, &self.templates).map_err(failed)
            }
            CurveShape::ParallelTo { target, .. } => {
                let target_path = finished(done, *target).ok_or_else(|| {
                    failed("its target curve has not been drawn".to_string())
                })?;
                parallel::parallel_path(target_path, from, to, self.line_width, self.fitter)
                    .map_err(|err| failed(err.to_string()))
            }
            CurveShape::SpecialSequence(legs) => {
                let mut path = Vec::new();
                for leg in legs {
                    let leg_path = draw::bend_path(
                        leg.bend,
                        self.layout.position(leg.from),
                        self.layout.position(leg.to),
                        &self.templates,
                    )
                    .map_err(|reason| {
                        failed(format!(
                            "leg to `{}`: {reason}",
                            self.network.station(leg.to).name()
                        ))
                    })?;
                    path.extend(leg_path);
                }
                Ok(path)
            }
            CurveShape::SpecialJoin(parts) => {
                let mut path = Vec::new();
                for part in parts {
                    let part_path = finished(done, *part)
                        .ok_or_else(|| failed("a joined curve has not been drawn".to_string()))?;
                    path.extend_from_slice(part_path);
                }
                Ok(path)
            }
        }
    }
}

fn finished(done: &[Option<Vec<LineSegment>>], id: CurveId) -> Option<&[LineSegment]> {
    done.get(id.index())?.as_deref()
}

#[cfg(test)]
mod tests {
    use metromap_core::{
        curve::{Bend, Curve, SequenceLeg},
        direction::Direction::*,
        geometry::Point,
        network::{LineId, Station, StationId, StationKind},
    };

    use super::*;

    struct Fixture {
        network: Network,
        line: LineId,
        positions: Vec<Point>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut network = Network::new();
            let line = network.add_line("red");
            Self {
                network,
                line,
                positions: Vec::new(),
            }
        }

        fn station(&mut self, name: &str, x: i64, y: i64) -> StationId {
            self.positions.push(Point::from_grid(x, y));
            self.network.add_station(Station::new(
                name,
                self.line,
                StationKind::Station,
                name,
                Point::from_grid(x, y),
            ))
        }

        fn curve(&mut self, from: StationId, to: StationId, shape: CurveShape) -> CurveId {
            self.network.add_curve(Curve {
                line: self.line,
                from,
                to,
                shape,
                source_line: 1,
            })
        }

        fn synthesize(&self) -> Result<CurvePaths, MetroMapError> {
            let layout = Layout::new(self.positions.clone(), vec![1]);
            synthesize_curves(
                &self.network,
                &layout,
                &templates::tests::demo_templates(),
                &AppConfig::default(),
                &SampledOffsetFitter::default(),
            )
        }
    }

    fn check_path(path: &[LineSegment], from: Point, to: Point) {
        assert_eq!(path[0].start(), from);
        assert_eq!(path[path.len() - 1].end(), to);
        for pair in path.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
    }

    #[test]
    fn test_template_curve() {
        let mut fixture = Fixture::new();
        let a = fixture.station("A", 0, 0);
        let b = fixture.station("B", 200, 200);
        let curve = fixture.curve(a, b, CurveShape::Sharp(Bend::new(Right, Down)));

        let paths = fixture.synthesize().unwrap();
        let path = paths.path(curve);

        check_path(path, Point::new(0.0, 0.0), Point::new(200.0, 200.0));
        assert_eq!(path.iter().filter(|s| !s.is_straight()).count(), 1);
    }

    #[test]
    fn test_sequence_chains_legs() {
        let mut fixture = Fixture::new();
        let a = fixture.station("A", 0, 0);
        let b = fixture.station("B", 200, 200);
        let c = fixture.station("C", 400, 400);
        let curve = fixture.curve(
            a,
            c,
            CurveShape::SpecialSequence(vec![
                SequenceLeg {
                    from: a,
                    to: b,
                    bend: Bend::new(Right, Down),
                },
                SequenceLeg {
                    from: b,
                    to: c,
                    bend: Bend::new(Down, Right),
                },
            ]),
        );

        let paths = fixture.synthesize().unwrap();
        let path = paths.path(curve);

        check_path(path, Point::new(0.0, 0.0), Point::new(400.0, 400.0));
        assert_eq!(path.iter().filter(|s| !s.is_straight()).count(), 2);
    }

    #[test]
    fn test_join_concatenates_parts() {
        let mut fixture = Fixture::new();
        let a = fixture.station("A", 0, 0);
        let p = fixture.station("p", 200, 200);
        let b = fixture.station("B", 400, 400);
        let first = fixture.curve(a, p, CurveShape::Sharp(Bend::new(Right, Down)));
        let second = fixture.curve(p, b, CurveShape::Sharp(Bend::new(Down, Right)));
        let join = fixture.curve(a, b, CurveShape::SpecialJoin(vec![first, second]));

        let paths = fixture.synthesize().unwrap();
        let expected: Vec<LineSegment> = paths
            .path(first)
            .iter()
            .chain(paths.path(second))
            .copied()
            .collect();
        assert_eq!(paths.path(join), expected.as_slice());
    }

    #[test]
    fn test_parallel_runs_outside_target() {
        let mut fixture = Fixture::new();
        let a = fixture.station("A", 0, 50);
        let b = fixture.station("B", 200, 250);
        let c = fixture.station("C", 0, 0);
        let d = fixture.station("D", 250, 250);
        let bend = Bend::new(Right, Down);
        let inner = fixture.curve(a, b, CurveShape::Sharp(bend));
        let outer = fixture.curve(c, d, CurveShape::ParallelTo { target: inner, bend });

        let paths = fixture.synthesize().unwrap();
        let path = paths.path(outer);

        check_path(path, Point::new(0.0, 0.0), Point::new(250.0, 250.0));
        let curved = path.iter().filter(|s| !s.is_straight()).count();
        assert_eq!(curved, 2);
    }

    #[test]
    fn test_unplaceable_curve_names_the_curve() {
        let mut fixture = Fixture::new();
        let a = fixture.station("A", 0, 0);
        let b = fixture.station("B", -100, 100);
        fixture.curve(a, b, CurveShape::Sharp(Bend::new(Right, Down)));

        let err = fixture.synthesize().unwrap_err();
        assert!(matches!(err, MetroMapError::Synthesis(_)));
        assert!(err.to_string().contains("red: A"), "{err}");
    }
}
