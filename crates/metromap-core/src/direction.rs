//! The eight compass directions of the schematic grid.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// One of the eight directions a metro line may run in.
///
/// "Up" is towards decreasing Y, matching screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

/// Error returned when a direction keyword is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl Direction {
    /// Every direction, cardinals first.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpRight,
        Direction::UpLeft,
        Direction::DownRight,
        Direction::DownLeft,
    ];

    /// The DSL keyword for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::UpRight => "up-right",
            Direction::UpLeft => "up-left",
            Direction::DownRight => "down-right",
            Direction::DownLeft => "down-left",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::UpRight => Direction::DownLeft,
            Direction::UpLeft => Direction::DownRight,
            Direction::DownRight => Direction::UpLeft,
            Direction::DownLeft => Direction::UpRight,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpRight | Direction::UpLeft | Direction::DownRight | Direction::DownLeft
        )
    }

    pub fn is_cardinal(self) -> bool {
        !self.is_diagonal()
    }

    /// Unit grid step `(dx, dy)` in screen coordinates.
    pub fn step(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpRight => (1, -1),
            Direction::UpLeft => (-1, -1),
            Direction::DownRight => (1, 1),
            Direction::DownLeft => (-1, 1),
        }
    }

    /// Whether `cardinal` is one of the two components of this diagonal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metromap_core::direction::Direction;
    /// assert!(Direction::UpRight.has_component(Direction::Up));
    /// assert!(Direction::UpRight.has_component(Direction::Right));
    /// assert!(!Direction::UpRight.has_component(Direction::Down));
    /// assert!(!Direction::Up.has_component(Direction::Up));
    /// ```
    pub fn has_component(self, cardinal: Direction) -> bool {
        if !self.is_diagonal() || !cardinal.is_cardinal() {
            return false;
        }
        let (dx, dy) = self.step();
        let (cx, cy) = cardinal.step();
        (cx != 0 && cx == dx) || (cy != 0 && cy == dy)
    }

    /// Whether the two directions are at right angles on the grid.
    pub fn is_perpendicular(self, other: Direction) -> bool {
        let (ax, ay) = self.step();
        let (bx, by) = other.step();
        ax * bx + ay * by == 0
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_str() == s)
            .ok_or_else(|| ParseDirectionError(s.to_string()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for direction in Direction::ALL {
            let parsed: Direction = direction.as_str().parse().unwrap();
            assert_eq!(parsed, direction);
            assert_eq!(parsed.to_string(), direction.as_str());
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert_eq!(err.to_string(), "unknown direction `sideways`");
    }

    #[test]
    fn test_opposite_is_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn test_perpendicular() {
        assert!(Direction::Up.is_perpendicular(Direction::Right));
        assert!(Direction::UpRight.is_perpendicular(Direction::DownRight));
        assert!(!Direction::Up.is_perpendicular(Direction::UpRight));
        assert!(!Direction::Left.is_perpendicular(Direction::Right));
    }
}
