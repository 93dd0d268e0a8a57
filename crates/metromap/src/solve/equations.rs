//! Linear equations derived from alignment constraints.
//!
//! Station coordinates are numbered so that station `s` owns variable
//! `2s` for X and `2s + 1` for Y.

use std::f64::consts::SQRT_2;

use log::trace;

use metromap_core::{
    constraint::{AlignmentConstraint, Axis, Component, ConstraintKind, Diagonal, Relation, Term},
    network::{Network, StationId},
};

/// A linear equality `Σ coefficient · variable = constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquality {
    terms: Vec<(usize, f64)>,
    constant: f64,
    source_line: usize,
}

impl LinearEquality {
    /// Creates an equality, merging repeated variables and dropping zero
    /// coefficients.
    pub fn new(terms: impl IntoIterator<Item = (usize, f64)>, constant: f64, source_line: usize) -> Self {
        let mut merged: Vec<(usize, f64)> = Vec::new();
        for (variable, coefficient) in terms {
            match merged.iter_mut().find(|(existing, _)| *existing == variable) {
                Some((_, sum)) => *sum += coefficient,
                None => merged.push((variable, coefficient)),
            }
        }
        merged.retain(|(_, coefficient)| *coefficient != 0.0);

        Self {
            terms: merged,
            constant,
            source_line,
        }
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// 1-based line of the constraint this equality came from.
    pub fn source_line(&self) -> usize {
        self.source_line
    }
}

pub(crate) fn x(station: StationId) -> usize {
    2 * station.index()
}

pub(crate) fn y(station: StationId) -> usize {
    2 * station.index() + 1
}

fn variable(term: &Term) -> usize {
    match term.component {
        Component::X => x(term.station),
        Component::Y => y(term.station),
    }
}

/// Collects equalities for one constraint.
struct Emitter<'e> {
    equalities: &'e mut Vec<LinearEquality>,
    source_line: usize,
}

impl Emitter<'_> {
    /// `a - b = constant`.
    fn difference(&mut self, a: usize, b: usize, constant: f64) {
        self.equalities.push(LinearEquality::new(
            [(a, 1.0), (b, -1.0)],
            constant,
            self.source_line,
        ));
    }

    fn diagonal(&mut self, diagonal: Diagonal, a: StationId, b: StationId) {
        // rising:  X(a) - X(b) = -(Y(a) - Y(b))
        // falling: X(a) - X(b) =   Y(a) - Y(b)
        let sign = match diagonal {
            Diagonal::Rising => 1.0,
            Diagonal::Falling => -1.0,
        };
        self.equalities.push(LinearEquality::new(
            [(x(a), 1.0), (x(b), -1.0), (y(a), sign), (y(b), -sign)],
            0.0,
            self.source_line,
        ));
    }

    /// Places `a` relative to `b`, one line width apart.
    fn same_station(&mut self, relation: Relation, a: StationId, b: StationId, width: f64) {
        let diagonal = (width / SQRT_2).floor();
        match relation {
            Relation::Above => {
                self.difference(x(a), x(b), 0.0);
                self.difference(y(a), y(b), -width);
            }
            Relation::Below => self.same_station(Relation::Above, b, a, width),
            Relation::Left => {
                self.difference(y(a), y(b), 0.0);
                self.difference(x(a), x(b), -width);
            }
            Relation::Right => self.same_station(Relation::Left, b, a, width),
            Relation::AboveRight => {
                self.difference(y(a), y(b), -diagonal);
                self.difference(x(a), x(b), diagonal);
            }
            Relation::BelowLeft => self.same_station(Relation::AboveRight, b, a, width),
            Relation::AboveLeft => {
                self.difference(y(a), y(b), -diagonal);
                self.difference(x(a), x(b), -diagonal);
            }
            Relation::BelowRight => self.same_station(Relation::AboveLeft, b, a, width),
            Relation::Exact => {
                self.difference(x(a), x(b), 0.0);
                self.difference(y(a), y(b), 0.0);
            }
        }
    }

    fn constraint(&mut self, kind: &ConstraintKind, width: f64) {
        match kind {
            ConstraintKind::Axis { axis, stations } => {
                for pair in stations.windows(2) {
                    match axis {
                        Axis::Vertical => self.difference(x(pair[0]), x(pair[1]), 0.0),
                        Axis::Horizontal => self.difference(y(pair[0]), y(pair[1]), 0.0),
                    }
                }
            }
            ConstraintKind::Diagonal { diagonal, stations } => {
                for pair in stations.windows(2) {
                    self.diagonal(*diagonal, pair[0], pair[1]);
                }
            }
            ConstraintKind::SameStation { relation, pairs } => {
                for (a, b) in pairs {
                    self.same_station(*relation, *a, *b, width);
                }
            }
            ConstraintKind::LinearEqual { lhs, rhs } => {
                let terms = lhs
                    .iter()
                    .map(|term| (variable(term), 1.0))
                    .chain(rhs.iter().map(|term| (variable(term), -1.0)));
                self.equalities
                    .push(LinearEquality::new(terms, 0.0, self.source_line));
            }
        }
    }
}

/// Translates every alignment constraint of the network into equalities.
pub(crate) fn build_equalities(network: &Network, line_width: f64) -> Vec<LinearEquality> {
    let mut equalities = Vec::new();
    for constraint in network.alignment_constraints() {
        let AlignmentConstraint {
            kind, source_line, ..
        } = constraint;
        let before = equalities.len();
        Emitter {
            equalities: &mut equalities,
            source_line: *source_line,
        }
        .constraint(kind, line_width);
        trace!(
            source_line = *source_line,
            equalities = equalities.len() - before;
            "Translated constraint"
        );
    }
    equalities
}
