//! Curve shapes between two stations of a line.
//!
//! A [`Bend`] names the direction a curve leaves its first station and the
//! direction it travels when it reaches the second one. Only two kinds of
//! bend are drawable: a 90° [`BendKind::Sharp`] turn between two
//! perpendicular cardinals, and a 135° [`BendKind::Wide`] turn between a
//! cardinal and a diagonal sharing that cardinal. Every drawable bend reduces
//! by reflection to one of a small set of canonical bends.

use std::fmt;

use crate::{
    direction::Direction,
    network::{CurveId, LineId, StationId},
};

/// The classification of a [`Bend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendKind {
    /// Both directions are the same; drawn as a straight line.
    Straight,
    /// A 90° turn between perpendicular cardinals.
    Sharp,
    /// A 135° turn between a cardinal and a diagonal containing it.
    Wide,
}

/// Departure and arrival direction of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bend {
    departure: Direction,
    arrival: Direction,
}

const CANONICAL_SHARP: [Bend; 4] = [
    Bend::new(Direction::Right, Direction::Up),
    Bend::new(Direction::Right, Direction::Down),
    Bend::new(Direction::Up, Direction::Right),
    Bend::new(Direction::Down, Direction::Right),
];

impl Bend {
    pub const fn new(departure: Direction, arrival: Direction) -> Self {
        Self { departure, arrival }
    }

    /// Direction of travel when leaving the `from` station.
    pub fn departure(self) -> Direction {
        self.departure
    }

    /// Direction of travel when reaching the `to` station.
    pub fn arrival(self) -> Direction {
        self.arrival
    }

    /// Classifies the bend, or returns `None` if it cannot be drawn.
    pub fn kind(self) -> Option<BendKind> {
        let (a, b) = (self.departure, self.arrival);
        if a == b {
            Some(BendKind::Straight)
        } else if a.is_cardinal() && b.is_cardinal() && a.is_perpendicular(b) {
            Some(BendKind::Sharp)
        } else if a.has_component(b) || b.has_component(a) {
            Some(BendKind::Wide)
        } else {
            None
        }
    }

    /// The same path described from the other end.
    pub fn reversed(self) -> Self {
        Self::new(self.arrival.opposite(), self.departure.opposite())
    }

    /// Whether the synthesizer has a direct construction for this bend.
    ///
    /// Canonical wide bends are exactly those that depart along a cardinal.
    pub fn is_canonical(self) -> bool {
        match self.kind() {
            Some(BendKind::Straight) => true,
            Some(BendKind::Sharp) => CANONICAL_SHARP.contains(&self),
            Some(BendKind::Wide) => self.departure.is_cardinal(),
            None => false,
        }
    }

    /// Reduces the bend to its canonical form.
    ///
    /// Returns the canonical bend and whether the curve had to be reversed
    /// (its `from` and `to` stations swapped) to get there. Returns `None`
    /// for bends that cannot be drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metromap_core::{curve::Bend, direction::Direction};
    /// let bend = Bend::new(Direction::Left, Direction::Down);
    /// let (canonical, reversed) = bend.canonicalize().unwrap();
    /// assert_eq!(canonical, Bend::new(Direction::Up, Direction::Right));
    /// assert!(reversed);
    /// ```
    pub fn canonicalize(self) -> Option<(Bend, bool)> {
        self.kind()?;
        if self.is_canonical() {
            return Some((self, false));
        }
        let reversed = self.reversed();
        reversed.is_canonical().then_some((reversed, true))
    }
}

impl fmt::Display for Bend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.departure, self.arrival)
    }
}

/// One leg of a [`CurveShape::SpecialSequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceLeg {
    pub from: StationId,
    pub to: StationId,
    pub bend: Bend,
}

/// How a curve is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveShape {
    /// A 90° template curve.
    Sharp(Bend),

    /// A 135° template curve. Straight bends are carried here too and
    /// synthesize to a single straight segment.
    Wide(Bend),

    /// Runs one line width outside another curve of the same bend.
    ParallelTo { target: CurveId, bend: Bend },

    /// A chain of ordinary curves through intermediate stations.
    SpecialSequence(Vec<SequenceLeg>),

    /// The concatenated paths of other curves, in order.
    SpecialJoin(Vec<CurveId>),
}

impl CurveShape {
    /// Wraps a bend in the matching template shape.
    pub fn from_bend(bend: Bend) -> Option<Self> {
        match bend.kind()? {
            BendKind::Sharp => Some(CurveShape::Sharp(bend)),
            BendKind::Wide | BendKind::Straight => Some(CurveShape::Wide(bend)),
        }
    }

    /// The bend of a template or parallel curve.
    pub fn bend(&self) -> Option<Bend> {
        match self {
            CurveShape::Sharp(bend)
            | CurveShape::Wide(bend)
            | CurveShape::ParallelTo { bend, .. } => Some(*bend),
            CurveShape::SpecialSequence(_) | CurveShape::SpecialJoin(_) => None,
        }
    }

    /// Curves that must be synthesized before this one.
    pub fn dependencies(&self) -> &[CurveId] {
        match self {
            CurveShape::ParallelTo { target, .. } => std::slice::from_ref(target),
            CurveShape::SpecialJoin(parts) => parts,
            CurveShape::Sharp(_) | CurveShape::Wide(_) | CurveShape::SpecialSequence(_) => &[],
        }
    }
}

/// A shaped, directed connection between two stations of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub line: LineId,
    pub from: StationId,
    pub to: StationId,
    pub shape: CurveShape,
    /// 1-based line of the declaration in the network file.
    pub source_line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    use Direction::*;

    #[test]
    fn test_kind() {
        assert_eq!(Bend::new(Right, Right).kind(), Some(BendKind::Straight));
        assert_eq!(Bend::new(Right, Down).kind(), Some(BendKind::Sharp));
        assert_eq!(Bend::new(Right, DownRight).kind(), Some(BendKind::Wide));
        assert_eq!(Bend::new(DownRight, Right).kind(), Some(BendKind::Wide));
        assert_eq!(Bend::new(Right, Left).kind(), None);
        assert_eq!(Bend::new(UpRight, DownRight).kind(), None);
        assert_eq!(Bend::new(Right, UpLeft).kind(), None);
    }

    #[test]
    fn test_canonical_sets() {
        let canonical: Vec<_> = Direction::ALL
            .into_iter()
            .flat_map(|a| Direction::ALL.into_iter().map(move |b| Bend::new(a, b)))
            .filter(|bend| bend.kind().is_some_and(|k| k != BendKind::Straight))
            .filter(|bend| bend.is_canonical())
            .collect();

        let sharp = canonical
            .iter()
            .filter(|b| b.kind() == Some(BendKind::Sharp))
            .count();
        let wide = canonical
            .iter()
            .filter(|b| b.kind() == Some(BendKind::Wide))
            .count();
        assert_eq!(sharp, 4);
        assert_eq!(wide, 8);
    }

    #[test]
    fn test_canonicalize_swaps_and_flips() {
        assert_eq!(
            Bend::new(UpRight, Right).canonicalize(),
            Some((Bend::new(Left, DownLeft), true))
        );
        assert_eq!(
            Bend::new(Left, Up).canonicalize(),
            Some((Bend::new(Down, Right), true))
        );
        assert_eq!(
            Bend::new(Right, Down).canonicalize(),
            Some((Bend::new(Right, Down), false))
        );
        assert_eq!(Bend::new(Up, Down).canonicalize(), None);
    }

    #[test]
    fn test_shape_dependencies() {
        let target = CurveId::new(3);
        let shape = CurveShape::ParallelTo {
            target,
            bend: Bend::new(Right, Down),
        };
        assert_eq!(shape.dependencies(), &[target]);
        assert!(
            CurveShape::Sharp(Bend::new(Right, Down))
                .dependencies()
                .is_empty()
        );
    }

    #[test]
    fn test_from_bend() {
        assert_eq!(
            CurveShape::from_bend(Bend::new(Up, Right)),
            Some(CurveShape::Sharp(Bend::new(Up, Right)))
        );
        assert_eq!(
            CurveShape::from_bend(Bend::new(Up, UpRight)),
            Some(CurveShape::Wide(Bend::new(Up, UpRight)))
        );
        assert_eq!(CurveShape::from_bend(Bend::new(Up, DownRight)), None);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    fn drawable_bend_strategy() -> impl Strategy<Value = Bend> {
        (direction_strategy(), direction_strategy())
            .prop_map(|(a, b)| Bend::new(a, b))
            .prop_filter("bend must be drawable", |bend| bend.kind().is_some())
    }

    /// Canonicalizing a canonical bend leaves it unchanged.
    fn check_canonicalize_is_idempotent(bend: Bend) -> Result<(), TestCaseError> {
        let (canonical, _) = bend
            .canonicalize()
            .ok_or_else(|| TestCaseError::fail("drawable bend must canonicalize"))?;

        prop_assert!(canonical.is_canonical());
        prop_assert_eq!(canonical.canonicalize(), Some((canonical, false)));
        prop_assert_eq!(canonical.kind(), bend.kind());
        Ok(())
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(bend in drawable_bend_strategy()) {
            check_canonicalize_is_idempotent(bend)?;
        }
    }
}
