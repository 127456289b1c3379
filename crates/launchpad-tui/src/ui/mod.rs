//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering
//! - `input`: Keyboard and mouse event handling
//! - `layout`: Screen geometry shared by render and input
//! - `styles`: Color schemes and text styling

pub mod input;
pub mod layout;
pub mod render;
pub mod styles;
