//! Alignment and draw-order constraints.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::network::{LineId, StationId};

/// Axis shared by consecutive stations of an axis constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Same X coordinate.
    Vertical,
    /// Same Y coordinate.
    Horizontal,
}

/// 45° diagonal shared by consecutive stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    /// Runs up and to the right (`up-right`, `down-left`).
    Rising,
    /// Runs down and to the right (`down-right`, `up-left`).
    Falling,
}

/// Where the first station sits relative to the second in a
/// `same-station` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Above,
    Below,
    Left,
    Right,
    AboveLeft,
    AboveRight,
    BelowLeft,
    BelowRight,
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown same-station relation `{0}`")]
pub struct ParseRelationError(pub String);

impl Relation {
    pub const ALL: [Relation; 9] = [
        Relation::Above,
        Relation::Below,
        Relation::Left,
        Relation::Right,
        Relation::AboveLeft,
        Relation::AboveRight,
        Relation::BelowLeft,
        Relation::BelowRight,
        Relation::Exact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Above => "above",
            Relation::Below => "below",
            Relation::Left => "left",
            Relation::Right => "right",
            Relation::AboveLeft => "above-left",
            Relation::AboveRight => "above-right",
            Relation::BelowLeft => "below-left",
            Relation::BelowRight => "below-right",
            Relation::Exact => "exact",
        }
    }
}

impl FromStr for Relation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|relation| relation.as_str() == s)
            .ok_or_else(|| ParseRelationError(s.to_string()))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A coordinate component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
}

/// One summand of a linear equality: a coordinate of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub station: StationId,
    pub component: Component,
}

/// What an alignment constraint requires.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    /// Every consecutive pair shares an axis.
    Axis { axis: Axis, stations: Vec<StationId> },

    /// Every consecutive pair lies on a 45° diagonal.
    Diagonal {
        diagonal: Diagonal,
        stations: Vec<StationId>,
    },

    /// Each pair is one physical station drawn on two lines, offset by a
    /// line width.
    SameStation {
        relation: Relation,
        pairs: Vec<(StationId, StationId)>,
    },

    /// The sum of the left terms equals the sum of the right terms.
    LinearEqual { lhs: Vec<Term>, rhs: Vec<Term> },
}

/// An exact relationship between station coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConstraint {
    pub kind: ConstraintKind,
    /// Owning line, `None` for constraints declared in multi-line context.
    pub line: Option<LineId>,
    /// 1-based line of the declaration in the network file.
    pub source_line: usize,
    /// The declaration as written, for messages.
    pub text: String,
}

/// `above` must be drawn on top of `below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZIndexConstraint {
    pub above: LineId,
    pub below: LineId,
    pub source_line: usize,
}
