use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Game;
use crate::utils::cmp_titles;

/// Ordering applied to the filtered game list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Newest release first
    #[default]
    Recent,
    /// Title A-Z
    Alpha,
    /// Most played first
    Plays,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Recent, SortMode::Alpha, SortMode::Plays];

    /// Value as it appears in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::Alpha => "alpha",
            SortMode::Plays => "plays",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Recent => "Newest",
            SortMode::Alpha => "A-Z",
            SortMode::Plays => "Most played",
        }
    }

    /// Get the next mode (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            SortMode::Recent => SortMode::Alpha,
            SortMode::Alpha => SortMode::Plays,
            SortMode::Plays => SortMode::Recent,
        }
    }

    /// Get the previous mode (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            SortMode::Recent => SortMode::Plays,
            SortMode::Alpha => SortMode::Recent,
            SortMode::Plays => SortMode::Alpha,
        }
    }

    /// Compare two games under this mode.
    pub fn compare(&self, a: &Game, b: &Game) -> Ordering {
        match self {
            SortMode::Alpha => cmp_titles(&a.title, &b.title),
            SortMode::Plays => b.plays().total_cmp(&a.plays()),
            SortMode::Recent => b.released_millis().cmp(&a.released_millis()),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortMode::Recent),
            "alpha" => Ok(SortMode::Alpha),
            "plays" => Ok(SortMode::Plays),
            other => Err(format!(
                "unknown sort mode '{}' (expected recent, alpha or plays)",
                other
            )),
        }
    }
}

/// Stable sort of store-indexed games by `mode`; equal elements keep
/// manifest order.
pub fn sort_games(games: &mut [(usize, &Game)], mode: SortMode) {
    games.sort_by(|(_, a), (_, b)| mode.compare(a, b));
}
