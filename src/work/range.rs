use crate::error::{WorkError, WorkOutcome};
use serde::Serialize;
use std::fmt;

/// Half-open interval `[start, end)`.
///
/// Every range in the engine uses the same convention: a value is a member when
/// `start <= value < end`. The thread range is also read as a pair of counts by
/// the balancer, with `start` the fewest partitions and `end` the most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    start: usize,
    end: usize,
}

impl Range {
    /// Build a range, rejecting `start > end`
    pub fn new(start: usize, end: usize) -> WorkOutcome<Self> {
        if start > end {
            return Err(WorkError::InvalidConfiguration(format!(
                "range start {start} is greater than end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// `[1, end)`, with `end` raised to 1 so the bounds stay ordered
    pub fn from_one(end: usize) -> Self {
        Self {
            start: 1,
            end: end.max(1),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// `start <= value < end`
    pub fn contains(&self, value: usize) -> bool {
        value >= self.start && value < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let cases = [
            (1, 10, 2, true),
            (1, 10, 10, false),
            (1, 10, 9, true),
            (5, 10, 1, false),
            (5, 10, 5, true),
            (5, 10, 4, false),
        ];

        for (start, end, value, expected) in cases {
            let range = Range::new(start, end).unwrap();
            assert_eq!(
                range.contains(value),
                expected,
                "{value} in {range} should be {expected}"
            );
        }
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = Range::new(5, 1).unwrap_err();
        assert!(matches!(err, WorkError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_range_has_no_members() {
        let range = Range::new(3, 3).unwrap();
        assert!((0..10).all(|value| !range.contains(value)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::new(1, 8).unwrap().to_string(), "[1..8)");
    }
}
