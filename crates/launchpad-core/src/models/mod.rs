//! Data models for the game manifest.
//!
//! - `Game`: one manifest record with absent-safe accessors
//! - `Released`: a release date given as text or as an epoch number

pub mod game;

pub use game::{Game, Released, DEFAULT_BADGE};
