//! Reduction of canonical bends to the two base cases.
//!
//! Only `right,down` (sharp) and `right,down-right` (wide) are constructed
//! directly. Every other canonical bend is mirrored onto one of them
//! through its `from` station, drawn, and mirrored back.

use metromap_core::{
    curve::Bend,
    direction::Direction::{self, Down, DownLeft, DownRight, Left, Right, Up, UpLeft, UpRight},
    geometry::{Point, Reflection},
};

/// The directly constructed curve shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseCase {
    /// `right,down`
    Sharp,
    /// `right,down-right`
    Wide,
}

impl BaseCase {
    #[cfg(test)]
    fn bend(self) -> Bend {
        match self {
            BaseCase::Sharp => Bend::new(Right, Down),
            BaseCase::Wide => Bend::new(Right, DownRight),
        }
    }
}

/// A mirror through the `from` station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mirror {
    FlipX,
    FlipY,
    FlipXY,
    /// Swaps the X and Y offsets.
    Diagonal,
}

impl Mirror {
    /// The mirror placed at `origin`.
    pub(crate) fn at(self, origin: Point) -> Reflection {
        match self {
            Mirror::FlipX => Reflection::FlipX(origin.x()),
            Mirror::FlipY => Reflection::FlipY(origin.y()),
            Mirror::FlipXY => Reflection::FlipXY {
                cx: origin.x(),
                cy: origin.y(),
            },
            Mirror::Diagonal => Reflection::diagonal_through(origin),
        }
    }

    #[cfg(test)]
    fn direction(self, direction: Direction) -> Direction {
        let (dx, dy) = direction.step();
        let step = match self {
            Mirror::FlipX => (-dx, dy),
            Mirror::FlipY => (dx, -dy),
            Mirror::FlipXY => (-dx, -dy),
            Mirror::Diagonal => (dy, dx),
        };
        Direction::ALL
            .into_iter()
            .find(|candidate| candidate.step() == step)
            .expect("mirrors map grid steps to grid steps")
    }
}

/// How a canonical bend is mapped onto its base case. The mirrors are
/// applied in order to go to the base case and in reverse to come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reduction {
    pub base: BaseCase,
    pub mirrors: &'static [Mirror],
}

const fn reduction(base: BaseCase, mirrors: &'static [Mirror]) -> Reduction {
    Reduction { base, mirrors }
}

/// Looks up the reduction of a canonical, non-straight bend.
pub(crate) fn reduce(bend: Bend) -> Option<Reduction> {
    use BaseCase::{Sharp, Wide};
    use Mirror::{Diagonal, FlipX, FlipXY, FlipY};

    let found = match (bend.departure(), bend.arrival()) {
        (Right, Down) => reduction(Sharp, &[]),
        (Right, Up) => reduction(Sharp, &[FlipY]),
        (Down, Right) => reduction(Sharp, &[Diagonal]),
        (Up, Right) => reduction(Sharp, &[FlipY, Diagonal]),

        (Right, DownRight) => reduction(Wide, &[]),
        (Right, UpRight) => reduction(Wide, &[FlipY]),
        (Left, UpLeft) => reduction(Wide, &[FlipXY]),
        (Left, DownLeft) => reduction(Wide, &[FlipX]),
        (Up, UpRight) => reduction(Wide, &[FlipY, Diagonal]),
        (Up, UpLeft) => reduction(Wide, &[FlipX, FlipY, Diagonal]),
        (Down, DownRight) => reduction(Wide, &[Diagonal]),
        (Down, DownLeft) => reduction(Wide, &[FlipX, Diagonal]),

        _ => return None,
    };
    Some(found)
}
