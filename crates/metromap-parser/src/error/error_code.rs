//! Error codes for the network diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Statement syntax errors
//! - `E2xx` - Reference errors
//! - `E3xx` - Consistency errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated quoted string.
    ///
    /// A quote was opened but not closed before the end of the line or a
    /// `#`, which starts a comment even inside quotes.
    E001,

    /// Unexpected character.
    E002,

    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Unrecognized statement.
    ///
    /// The first word of the line is not a known keyword.
    E100,

    /// Wrong number of arguments.
    ///
    /// The statement has missing or trailing words.
    E101,

    /// Invalid integer coordinate.
    E102,

    /// Invalid curve shape.
    ///
    /// Shapes are `special` or two directions such as `right,down` forming
    /// a 90° or 135° turn.
    E103,

    /// Invalid endpoint type or half modifier.
    E104,

    /// Invalid same-station direction.
    E105,

    /// Malformed term in an `equal` constraint.
    ///
    /// Terms look like `station.x` or `line: station.y`.
    E106,

    /// Malformed `line: station` reference.
    E107,

    /// Statement requires an active line.
    ///
    /// Stations, edges, curves and endpoints must follow a `line` header.
    E108,

    // =========================================================================
    // Reference Errors (E2xx)
    // =========================================================================
    /// Unknown station.
    E200,

    /// Unknown line.
    E201,

    /// Unknown curve.
    E202,

    /// Duplicate line declaration.
    E203,

    /// Duplicate station declaration.
    E204,

    /// Missing external station id.
    ///
    /// The station-id table has no entry for this line and station.
    E205,

    /// Curve between stations that share no edge.
    E206,

    /// Duplicate or reversed curve.
    ///
    /// At most one curve may join a pair of stations, in either direction.
    E207,

    // =========================================================================
    // Consistency Errors (E3xx)
    // =========================================================================
    /// Orphan station.
    ///
    /// A station is not part of any edge.
    E300,

    /// Parallel curve shape mismatch.
    ///
    /// A curve must have the same shape as the curve it is parallel to.
    E301,

    /// Invalid parallel or join target.
    E302,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Syntax errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
            // Reference errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            // Consistency errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated quoted string",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E100 => "unrecognized statement",
            ErrorCode::E101 => "wrong number of arguments",
            ErrorCode::E102 => "invalid integer coordinate",
            ErrorCode::E103 => "invalid curve shape",
            ErrorCode::E104 => "invalid endpoint type",
            ErrorCode::E105 => "invalid same-station direction",
            ErrorCode::E106 => "malformed equal term",
            ErrorCode::E107 => "malformed station reference",
            ErrorCode::E108 => "statement requires an active line",
            ErrorCode::E200 => "unknown station",
            ErrorCode::E201 => "unknown line",
            ErrorCode::E202 => "unknown curve",
            ErrorCode::E203 => "duplicate line",
            ErrorCode::E204 => "duplicate station",
            ErrorCode::E205 => "missing station id",
            ErrorCode::E206 => "curve without edge",
            ErrorCode::E207 => "duplicate curve",
            ErrorCode::E300 => "orphan station",
            ErrorCode::E301 => "parallel shape mismatch",
            ErrorCode::E302 => "invalid curve target",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
