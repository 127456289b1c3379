use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Badge shown on a card when the game carries no tags.
pub const DEFAULT_BADGE: &str = "Game";

/// One playable entry in the manifest.
///
/// Only `title` is required to decode. `path` is required by the manifest
/// contract but tolerated when missing so a partially filled manifest still
/// renders; everything else is optional and read through the absent-safe
/// accessors below. A field holding an unexpected JSON type is treated as
/// absent rather than failing the whole manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(default, deserialize_with = "lenient::scalar")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient::scalar")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub plays: Option<f64>,
    #[serde(default, deserialize_with = "lenient::released", skip_serializing_if = "Option::is_none")]
    pub released: Option<Released>,
}

/// Field decoders that accept whatever JSON type a hand-written manifest
/// happens to use.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Released;

    /// String or number as text; anything else is empty.
    pub fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// A number, or a string holding one (`"1200"`).
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let n = match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(n.filter(|n| n.is_finite()))
    }

    /// A list of tags, or a single tag given as a bare string.
    pub fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::String(s) => Some(vec![s]),
            _ => None,
        })
    }

    pub fn released<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Released>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().map(Released::Epoch),
            Value::String(s) => Some(Released::Text(s)),
            _ => None,
        })
    }
}

/// Release date as found in the manifest: either a date string or an epoch
/// number in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Released {
    Epoch(f64),
    Text(String),
}

impl Released {
    /// Milliseconds since the Unix epoch, or `None` when the text is not a
    /// recognizable date.
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self {
            Released::Epoch(ms) if ms.is_finite() => Some(*ms as i64),
            Released::Epoch(_) => None,
            Released::Text(text) => parse_date_millis(text.trim()),
        }
    }
}

/// Parse the date shapes a manifest author is likely to write.
/// Times without an offset are read as UTC.
fn parse_date_millis(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    // YYYY-MM-DD, YYYY-MM and YYYY all land on the first matching day
    let padded = match text.len() {
        4 => format!("{}-01-01", text),
        7 => format!("{}-01", text),
        _ => text.to_string(),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

impl Game {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn duration(&self) -> &str {
        self.duration.as_deref().unwrap_or("")
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    /// First tag, or the generic "Game" label.
    pub fn badge(&self) -> &str {
        self.tags()
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_BADGE)
    }

    /// Play count for popularity sorting; absent counts as zero.
    pub fn plays(&self) -> f64 {
        self.plays.unwrap_or(0.0)
    }

    /// Release timestamp for recency sorting; absent or unparsable dates
    /// count as the epoch.
    pub fn released_millis(&self) -> i64 {
        self.released
            .as_ref()
            .and_then(Released::timestamp_millis)
            .unwrap_or(0)
    }

    pub fn plays_display(&self) -> String {
        match self.plays {
            Some(p) if p >= 1_000_000.0 => format!("{:.1}M plays", p / 1_000_000.0),
            Some(p) if p >= 1_000.0 => format!("{:.1}k plays", p / 1_000.0),
            Some(p) => format!("{} plays", p as u64),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_minimal_record() {
        let game: Game = serde_json::from_str(r#"{"id":"a","title":"Zeta"}"#)
            .expect("minimal record should parse");
        assert_eq!(game.title, "Zeta");
        assert_eq!(game.path, "");
        assert_eq!(game.description(), "");
        assert_eq!(game.badge(), "Game");
        assert_eq!(game.plays(), 0.0);
        assert_eq!(game.released_millis(), 0);
    }

    #[test]
    fn test_game_missing_title_is_rejected() {
        let parsed = serde_json::from_str::<Game>(r#"{"id":"a","path":"x.html"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_game_full_record() {
        let json = r#"{
            "id": "idle-miner",
            "title": "Idle Miner",
            "path": "games/idle-miner/index.html",
            "description": "Dig deeper.",
            "thumbnail": "games/idle-miner/thumb.png",
            "duration": "5 min",
            "tags": ["Idle", "Clicker"],
            "plays": 1520,
            "released": "2024-03-15"
        }"#;
        let game: Game = serde_json::from_str(json).expect("full record should parse");
        assert_eq!(game.badge(), "Idle");
        assert_eq!(game.tags().len(), 2);
        assert_eq!(game.plays(), 1520.0);
        assert_eq!(game.released, Some(Released::Text("2024-03-15".to_string())));
        assert_eq!(game.plays_display(), "1.5k plays");
    }

    #[test]
    fn test_game_numeric_id_and_string_plays() {
        let game: Game = serde_json::from_str(
            r#"{"id":1,"title":"Alpha","path":"a/","plays":"1200","tags":"Idle"}"#,
        )
        .expect("loosely typed record should parse");
        assert_eq!(game.id, "1");
        assert_eq!(game.plays(), 1200.0);
        assert_eq!(game.tags(), ["Idle".to_string()]);
        assert_eq!(game.badge(), "Idle");
    }

    #[test]
    fn test_game_wrong_types_read_as_absent() {
        let game: Game = serde_json::from_str(
            r#"{"title":"Odd","path":null,"description":7,"thumbnail":false,
                "plays":"lots","tags":{"a":1},"released":[2024]}"#,
        )
        .expect("wrong-typed optional fields should not fail the record");
        assert_eq!(game.path, "");
        assert_eq!(game.description(), "");
        assert_eq!(game.thumbnail, None);
        assert_eq!(game.plays(), 0.0);
        assert!(game.tags().is_empty());
        assert_eq!(game.released_millis(), 0);
    }

    #[test]
    fn test_released_epoch_number() {
        let game: Game =
            serde_json::from_str(r#"{"title":"T","released":1700000000000}"#).expect("parse");
        assert_eq!(game.released_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_released_text_formats() {
        let day = Released::Text("2024-01-02".to_string()).timestamp_millis();
        let rfc = Released::Text("2024-01-02T00:00:00Z".to_string()).timestamp_millis();
        assert_eq!(day, rfc);

        let month = Released::Text("2024-01".to_string()).timestamp_millis();
        let year = Released::Text("2024".to_string()).timestamp_millis();
        assert_eq!(month, year);
        assert!(day > month);

        assert_eq!(Released::Text("someday".to_string()).timestamp_millis(), None);
        assert_eq!(Released::Text(String::new()).timestamp_millis(), None);
    }
}
