//! Team balancing for a fixed 5-a-side game.
//!
//! Every search walks index combinations in ascending bitmask order (player
//! `i` is bit `i`) and keeps the first candidate that reaches the lowest
//! score, so results are stable for a given input order and rating table.
//!
//! - [`Balancer::split_optimal`] - best 5v5 split of exactly ten players
//! - [`Balancer::ranked_split`] - k-th best of the 126 distinct partitions
//! - [`Balancer::select_and_split_optimal`] - choose ten of many, then split
//! - [`Balancer::select_random`] - random ten, random split

mod selection;
mod split;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::RatingTable;

pub const TEAM_SIZE: usize = 5;
pub const SQUAD_SIZE: usize = 2 * TEAM_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancerSettings {
    /// Largest confirmed list searched exhaustively for the best ten.
    pub exhaustive_limit: usize,
    /// Random ten-player samples drawn above `exhaustive_limit`.
    pub random_samples: usize,
    /// Sampling stops once a score below this is found.
    pub early_exit_threshold: f64,
}

impl Default for BalancerSettings {
    fn default() -> Self {
        Self { exhaustive_limit: 20, random_samples: 8_000, early_exit_threshold: 0.01 }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BalancerError {
    #[error("{confirmed} confirmed players, {required} required (short by {})", .required - .confirmed)]
    InsufficientPlayers { confirmed: usize, required: usize },
    #[error("expected exactly {expected} players, got {actual}")]
    InvalidCount { expected: usize, actual: usize },
    #[error("rank {rank} is out of range ({available} distinct splits available)")]
    RankOutOfRange { rank: usize, available: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamSplit {
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub sum_a: f64,
    pub sum_b: f64,
}

impl TeamSplit {
    /// Fairness score: absolute difference of the rating sums.
    pub fn difference(&self) -> f64 {
        (self.sum_a - self.sum_b).abs()
    }

    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.team_a.iter().chain(self.team_b.iter()).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitQuality {
    Exact,
    Approximate,
    Random,
}

impl SplitQuality {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
            Self::Random => "random",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub split: TeamSplit,
    /// Confirmed players left out of the ten, in confirmed order.
    pub substitutes: Vec<String>,
    pub score: f64,
    pub quality: SplitQuality,
    /// Position among the ranked partitions when a non-optimal rank was requested.
    pub rank: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Balancer {
    ratings: Arc<RatingTable>,
    settings: BalancerSettings,
}

impl Balancer {
    pub fn new(ratings: Arc<RatingTable>, settings: BalancerSettings) -> Self {
        Self { ratings, settings }
    }

    pub fn rating_of(&self, name: &str) -> f64 {
        self.ratings.rating_of(name)
    }

    pub fn ratings(&self) -> &RatingTable {
        &self.ratings
    }

    pub fn settings(&self) -> &BalancerSettings {
        &self.settings
    }

    fn ratings_for<S: AsRef<str>>(&self, players: &[S]) -> Vec<f64> {
        players.iter().map(|name| self.rating_of(name.as_ref())).collect()
    }
}

impl Default for Balancer {
    fn default() -> Self {
        Self::new(Arc::new(RatingTable::default()), BalancerSettings::default())
    }
}

fn require_at_least(players: usize, required: usize) -> Result<(), BalancerError> {
    if players < required {
        return Err(BalancerError::InsufficientPlayers { confirmed: players, required });
    }
    Ok(())
}

fn require_exactly(players: usize, expected: usize) -> Result<(), BalancerError> {
    if players != expected {
        return Err(BalancerError::InvalidCount { expected, actual: players });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BalancerError, TeamSplit};

    #[test]
    fn insufficient_players_reports_shortfall() {
        let error = BalancerError::InsufficientPlayers { confirmed: 9, required: 10 };
        assert_eq!(error.to_string(), "9 confirmed players, 10 required (short by 1)");
    }

    #[test]
    fn difference_is_absolute() {
        let split = TeamSplit { team_a: vec![], team_b: vec![], sum_a: 10.0, sum_b: 12.5 };
        assert_eq!(split.difference(), 2.5);
    }
}
