//! Fruit ranks
//!
//! A rank is the merge tier of a fruit. Two fruit of the same rank merge into
//! the next one; at the ceiling they vanish instead.

use serde::{Deserialize, Serialize};

use crate::experp;

/// Merge tier of a fruit (0 = cherry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(u8);

impl Rank {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps ranks to size and score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankModel {
    max_rank: Rank,
    min_radius: f32,
    max_radius: f32,
}

impl RankModel {
    pub fn new(max_rank: Rank, min_radius: f32, max_radius: f32) -> Self {
        assert!(min_radius > 0.0, "fruit radius must be positive");
        assert!(max_radius >= min_radius, "max radius below min radius");
        Self {
            max_rank,
            min_radius,
            max_radius,
        }
    }

    /// Merge ceiling
    pub fn max_rank(&self) -> Rank {
        self.max_rank
    }

    pub fn contains(&self, rank: Rank) -> bool {
        rank <= self.max_rank
    }

    /// Rank as a fraction of the ceiling, in [0, 1]
    pub fn fraction(&self, rank: Rank) -> f32 {
        if self.max_rank.0 == 0 {
            0.0
        } else {
            rank.0 as f32 / self.max_rank.0 as f32
        }
    }

    /// Physical radius: exponential between the smallest and largest fruit
    pub fn radius_of(&self, rank: Rank) -> f32 {
        assert!(self.contains(rank), "rank {} above ceiling {}", rank, self.max_rank);
        experp(self.min_radius, self.max_radius, self.fraction(rank))
    }

    /// Points awarded for merging two fruit of `rank`: 1, 3, 6, 10, ...
    pub fn score_value(&self, rank: Rank) -> u64 {
        let r = rank.0 as u64;
        (r + 1) * (r + 2) / 2
    }

    /// Rank produced by a merge, `None` at the ceiling
    pub fn next(&self, rank: Rank) -> Option<Rank> {
        if rank < self.max_rank {
            Some(Rank(rank.0 + 1))
        } else {
            None
        }
    }
}
