//! Common types shared between the trace and call-graph modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Location Type
// ============================================================================

/// Location in a source file.
///
/// Coordinates follow the Python AST convention:
/// - `line`: 1-indexed line number
/// - `col`: 0-indexed column offset
///
/// Locations order by line, then column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column offset (0-indexed).
    pub col: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(line: u32, col: u32) -> Self {
        Location { line, col }
    }

    /// Parse a location from "line:col" format.
    pub fn parse(s: &str) -> Option<Self> {
        let (line, col) = s.split_once(':')?;
        Some(Location::new(line.trim().parse().ok()?, col.trim().parse().ok()?))
    }

    /// The same line with a different column.
    pub fn with_col(self, col: u32) -> Self {
        Location { col, ..self }
    }

    fn sort_key(&self) -> (u32, u32) {
        (self.line, self.col)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl From<(u32, u32)> for Location {
    fn from((line, col): (u32, u32)) -> Self {
        Location::new(line, col)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_orders_by_line_then_col() {
        let mut locs = vec![
            Location::new(2, 0),
            Location::new(1, 8),
            Location::new(1, 3),
        ];
        locs.sort();
        assert_eq!(
            locs,
            vec![Location::new(1, 3), Location::new(1, 8), Location::new(2, 0)]
        );
    }

    #[test]
    fn location_parse_valid() {
        assert_eq!(Location::parse("4:12"), Some(Location::new(4, 12)));
    }

    #[test]
    fn location_parse_invalid() {
        assert!(Location::parse("4").is_none());
        assert!(Location::parse("a:1").is_none());
    }

    #[test]
    fn location_display_round_trips_through_parse() {
        let loc = Location::new(10, 0);
        assert_eq!(Location::parse(&loc.to_string()), Some(loc));
    }

    #[test]
    fn location_serializes_as_line_and_col() {
        let json = serde_json::to_string(&Location::new(3, 7)).unwrap();
        assert_eq!(json, r#"{"line":3,"col":7}"#);
    }
}
