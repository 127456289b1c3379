use crate::models::Game;
use crate::utils::encode_uri_component;

/// Placeholder image service used when a game has no thumbnail.
const PLACEHOLDER_THUMBNAIL_BASE: &str = "https://dummyimage.com/640x360/0b1026/ffffff&text=";

/// Everything a display surface needs to draw one game card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCard {
    /// Position of the record in the store, used to open its details.
    pub index: usize,
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub badge: String,
    pub duration: String,
    /// Target of the "Play" action.
    pub play_path: String,
}

impl GameCard {
    pub fn from_game(index: usize, game: &Game) -> Self {
        Self {
            index,
            id: game.id.clone(),
            title: game.title.clone(),
            description: game.description().to_string(),
            thumbnail: thumbnail_for(game),
            badge: game.badge().to_string(),
            duration: game.duration().to_string(),
            play_path: game.path.clone(),
        }
    }
}

/// The game's own thumbnail, or a placeholder image keyed by its title.
pub fn thumbnail_for(game: &Game) -> String {
    match game.thumbnail.as_deref() {
        Some(thumb) if !thumb.is_empty() => thumb.to_string(),
        _ => placeholder_thumbnail(&game.title),
    }
}

pub fn placeholder_thumbnail(title: &str) -> String {
    format!("{}{}", PLACEHOLDER_THUMBNAIL_BASE, encode_uri_component(title))
}
