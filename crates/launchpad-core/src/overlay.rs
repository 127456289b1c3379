//! Detail overlay view model.
//!
//! Holds the expanded view of one game: title, description, every tag and
//! the "Play now" target. The display surface decides how it is drawn and
//! dismissed.

use crate::models::Game;

pub const PLAY_NOW_LABEL: &str = "Play now";
pub const CLOSE_LABEL: &str = "Close";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOverlay {
    /// Position of the record in the store.
    pub index: usize,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Play count such as "1.5k plays"; empty when the manifest has none.
    pub plays: String,
    pub play_path: String,
}

impl DetailOverlay {
    pub fn from_game(index: usize, game: &Game) -> Self {
        Self {
            index,
            title: game.title.clone(),
            description: game.description().to_string(),
            tags: game.tags().to_vec(),
            plays: game.plays_display(),
            play_path: game.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_carries_all_tags() {
        let game: Game = serde_json::from_str(
            r#"{"id":"x","title":"Orbit","path":"games/orbit/","description":"Spin fast.",
                "tags":["Arcade","Space","Short"],"plays":2300000}"#,
        )
        .expect("test game");
        let overlay = DetailOverlay::from_game(2, &game);
        assert_eq!(overlay.index, 2);
        assert_eq!(overlay.title, "Orbit");
        assert_eq!(overlay.description, "Spin fast.");
        assert_eq!(overlay.tags, vec!["Arcade", "Space", "Short"]);
        assert_eq!(overlay.plays, "2.3M plays");
        assert_eq!(overlay.play_path, "games/orbit/");
    }

    #[test]
    fn test_overlay_absent_fields() {
        let game: Game = serde_json::from_str(r#"{"title":"Bare"}"#).expect("test game");
        let overlay = DetailOverlay::from_game(0, &game);
        assert!(overlay.tags.is_empty());
        assert_eq!(overlay.description, "");
        assert_eq!(overlay.plays, "");
    }
}
