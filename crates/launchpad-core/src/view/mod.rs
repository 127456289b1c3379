//! Filter, sort and card building for the game grid.
//!
//! `build_view` is a pure function of the loaded games and the current view
//! state. The terminal calls it on every search or sort change and redraws
//! the whole grid from its output; there is no incremental update.

pub mod card;
pub mod sort;

pub use card::{placeholder_thumbnail, thumbnail_for, GameCard};
pub use sort::{sort_games, SortMode};

use crate::models::Game;

/// The loaded game list.
///
/// Filled exactly once by the manifest loader and read-only afterwards, so
/// render and filter only ever borrow it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStore {
    games: Vec<Game>,
}

impl GameStore {
    pub fn new(games: Vec<Game>) -> Self {
        Self { games }
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn get(&self, index: usize) -> Option<&Game> {
        self.games.get(index)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Search text and sort mode, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub sort: SortMode,
}

impl ViewState {
    pub fn new(query: impl Into<String>, sort: SortMode) -> Self {
        Self {
            query: query.into(),
            sort,
        }
    }

    /// Lowercased, trimmed query used for matching.
    pub fn normalized_query(&self) -> String {
        self.query.to_lowercase().trim().to_string()
    }
}

/// Check whether a game matches an already normalized query.
///
/// Tags are matched as one space-joined string, so a query may span two
/// adjacent tags.
pub fn matches_query(game: &Game, query: &str) -> bool {
    query.is_empty()
        || game.title.to_lowercase().contains(query)
        || game.tags().join(" ").to_lowercase().contains(query)
}

/// Games passing the current query, in manifest order, with their store index.
pub fn filter_games<'a>(store: &'a GameStore, query: &str) -> Vec<(usize, &'a Game)> {
    store
        .games()
        .iter()
        .enumerate()
        .filter(|(_, g)| matches_query(g, query))
        .collect()
}

/// Derive the ordered card list shown in the grid.
pub fn build_view(store: &GameStore, state: &ViewState) -> Vec<GameCard> {
    let query = state.normalized_query();
    let mut items = filter_games(store, &query);
    sort_games(&mut items, state.sort);
    items
        .into_iter()
        .map(|(index, game)| GameCard::from_game(index, game))
        .collect()
}
