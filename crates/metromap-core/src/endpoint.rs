//! Terminal decorations drawn across the end of a line.

use std::str::FromStr;

use thiserror::Error;

use crate::{direction::Direction, network::StationId};

/// The axis an endpoint bar is drawn along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointAxis {
    Horizontal,
    Vertical,
    /// `up-right` / `down-left`.
    Rising,
    /// `down-right` / `up-left`.
    Falling,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown endpoint type `{0}`")]
pub struct ParseEndpointAxisError(pub String);

impl EndpointAxis {
    /// The two directions pointing along this axis, towards the `p0` end
    /// first.
    pub fn directions(self) -> (Direction, Direction) {
        match self {
            EndpointAxis::Horizontal => (Direction::Left, Direction::Right),
            EndpointAxis::Vertical => (Direction::Up, Direction::Down),
            EndpointAxis::Rising => (Direction::DownLeft, Direction::UpRight),
            EndpointAxis::Falling => (Direction::UpLeft, Direction::DownRight),
        }
    }

    /// Whether `half` is a valid half modifier for this axis.
    pub fn accepts_half(self, half: Direction) -> bool {
        let (a, b) = self.directions();
        half == a || half == b
    }
}

impl FromStr for EndpointAxis {
    type Err = ParseEndpointAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(EndpointAxis::Horizontal),
            "vertical" => Ok(EndpointAxis::Vertical),
            "up-right" | "down-left" => Ok(EndpointAxis::Rising),
            "down-right" | "up-left" => Ok(EndpointAxis::Falling),
            _ => Err(ParseEndpointAxisError(s.to_string())),
        }
    }
}

/// A short bar drawn across a terminal station.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub station: StationId,
    pub axis: EndpointAxis,
    /// When set, only the half of the bar pointing this way is drawn.
    pub half: Option<Direction>,
    pub source_line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_aliases() {
        assert_eq!("up-left".parse::<EndpointAxis>(), Ok(EndpointAxis::Falling));
        assert_eq!("down-left".parse::<EndpointAxis>(), Ok(EndpointAxis::Rising));
        assert!("up".parse::<EndpointAxis>().is_err());
    }

    #[test]
    fn test_accepts_half() {
        assert!(EndpointAxis::Horizontal.accepts_half(Direction::Left));
        assert!(!EndpointAxis::Horizontal.accepts_half(Direction::Up));
        assert!(EndpointAxis::Rising.accepts_half(Direction::DownLeft));
        assert!(!EndpointAxis::Rising.accepts_half(Direction::DownRight));
    }
}
