///
/// Source Location Module
///
/// This module provides types for mapping expression nodes back to source
/// positions. The parser records a byte offset for each node it produces,
/// plus the offsets at which source lines begin; the checker resolves those
/// into line/column pairs when it reports diagnostics.
///
/// Key types:
/// - SourceInfo: line-start offsets and per-node byte offsets
/// - Location: a 1-based line/column pair, with a NONE sentinel for nodes
///   the parser recorded no position for
///
/// Design decisions:
/// - Offsets are byte-based, not character-based (faster, works with UTF-8)
/// - Location resolution is a linear scan over the line offsets; line
///   tables are small and the scan only runs when a diagnostic is emitted
///

use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Sentinel for nodes without a recorded position. Real locations are
    /// 1-based in the line, so {0, 0} can never be produced by resolution.
    pub const NONE: Location = Location { line: 0, column: 0 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_none(&self) -> bool {
        *self == Location::NONE
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "?:?")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInfo {
    line_offsets: Vec<u32>,
    positions: HashMap<i64, u32>,
}

impl SourceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `line_offsets` holds the byte offset at which each line after the
    /// first begins, in ascending order.
    pub fn with_line_offsets(line_offsets: Vec<u32>) -> Self {
        Self {
            line_offsets,
            positions: HashMap::new(),
        }
    }

    pub fn add_position(&mut self, id: i64, offset: u32) {
        self.positions.insert(id, offset);
    }

    pub fn position(&self, id: i64) -> Option<u32> {
        self.positions.get(&id).copied()
    }

    pub fn line_offsets(&self) -> &[u32] {
        &self.line_offsets
    }

    /// Resolve a node id to a line/column pair. The column is the distance
    /// from the start of the line; on the first line it equals the raw
    /// offset. Nodes without a recorded position resolve to Location::NONE.
    pub fn location(&self, id: i64) -> Location {
        let Some(offset) = self.position(id) else {
            return Location::NONE;
        };
        let mut line = 1u32;
        let mut column = offset;
        for &line_offset in &self.line_offsets {
            if line_offset < offset {
                line += 1;
                column = offset - line_offset;
            } else {
                break;
            }
        }
        Location::new(line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_first_line() {
        let mut info = SourceInfo::with_line_offsets(vec![10, 20]);
        info.add_position(1, 4);
        assert_eq!(info.location(1), Location::new(1, 4));
    }

    #[test]
    fn test_location_later_line() {
        let mut info = SourceInfo::with_line_offsets(vec![10, 20]);
        info.add_position(1, 15);
        assert_eq!(info.location(1), Location::new(2, 5));
        info.add_position(2, 23);
        assert_eq!(info.location(2), Location::new(3, 3));
    }

    #[test]
    fn test_location_on_line_boundary() {
        let mut info = SourceInfo::with_line_offsets(vec![10]);
        info.add_position(1, 10);
        // An offset equal to a line start still belongs to the prior line.
        assert_eq!(info.location(1), Location::new(1, 10));
    }

    #[test]
    fn test_location_unknown_id() {
        let info = SourceInfo::new();
        assert_eq!(info.location(42), Location::NONE);
        assert!(info.location(42).is_none());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(3, 7).to_string(), "3:7");
        assert_eq!(Location::NONE.to_string(), "?:?");
    }
}
