//! Column orderings and lexicographic row comparison

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::datum::Datum;

/// Sort direction of one ordering column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }

    /// Returns the opposite direction
    pub fn invert(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    /// Applies this direction to an ascending comparison result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordering column: index into the row plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnOrderInfo {
    pub col_idx: usize,
    pub direction: Direction,
}

impl ColumnOrderInfo {
    pub fn asc(col_idx: usize) -> Self {
        Self {
            col_idx,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(col_idx: usize) -> Self {
        Self {
            col_idx,
            direction: Direction::Descending,
        }
    }
}

/// Ordered sequence of ordering columns. Empty means no sort is needed.
pub type ColumnOrdering = Vec<ColumnOrderInfo>;

/// Compares two rows lexicographically under `ordering`.
///
/// Position 0 is compared first; on equality the next position decides.
/// Rows equal on every ordering column compare `Equal`.
pub fn compare_rows(ordering: &[ColumnOrderInfo], a: &[Datum], b: &[Datum]) -> Ordering {
    for info in ordering {
        let c = a[info.col_idx].compare(&b[info.col_idx]);
        if c != Ordering::Equal {
            return info.direction.apply(c);
        }
    }
    Ordering::Equal
}
