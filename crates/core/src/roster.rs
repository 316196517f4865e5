use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_RATING: f64 = 5.0;

/// Poll order and ratings used when no configuration overrides them.
pub const DEFAULT_PLAYERS: [(&str, f64); 14] = [
    ("Caria", 71.9),
    ("Tiago", 51.9),
    ("Filipe", 58.1),
    ("Francisco", 73.8),
    ("Gui", 66.9),
    ("João", 50.1),
    ("Miguel", 67.3),
    ("Pedro", 69.3),
    ("Rodrigo", 56.4),
    ("Salvador", 80.0),
    ("Pipa", 49.3),
    ("André", 55.1),
    ("Fontes", 41.6),
    ("Vasco", 73.9),
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster must contain at least one player")]
    Empty,
    #[error("roster entry at position {position} is blank")]
    BlankName { position: usize },
    #[error("roster lists `{0}` more than once")]
    Duplicate(String),
}

/// Ordered list of people polled during an attendance check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<String>,
}

impl Roster {
    pub fn new<I, S>(players: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let players: Vec<String> = players.into_iter().map(Into::into).collect();
        if players.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::with_capacity(players.len());
        for (index, name) in players.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(RosterError::BlankName { position: index + 1 });
            }
            if !seen.insert(name.as_str()) {
                return Err(RosterError::Duplicate(name.clone()));
            }
        }

        Ok(Self { players })
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.players.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self { players: DEFAULT_PLAYERS.iter().map(|(name, _)| (*name).to_owned()).collect() }
    }
}

/// Static skill lookup. Unknown names score `default_rating`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    ratings: BTreeMap<String, f64>,
    default_rating: f64,
}

impl RatingTable {
    pub fn new(ratings: BTreeMap<String, f64>, default_rating: f64) -> Self {
        Self { ratings, default_rating }
    }

    pub fn rating_of(&self, name: &str) -> f64 {
        self.ratings.get(name).copied().unwrap_or(self.default_rating)
    }

    pub fn is_rated(&self, name: &str) -> bool {
        self.ratings.contains_key(name)
    }

    pub fn default_rating(&self) -> f64 {
        self.default_rating
    }
}

impl Default for RatingTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_PLAYERS.iter().map(|(name, rating)| ((*name).to_owned(), *rating)).collect(),
            DEFAULT_RATING,
        )
    }
}

impl FromIterator<(String, f64)> for RatingTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect(), DEFAULT_RATING)
    }
}
