//! Keyboard and mouse input handling for the TUI.
//!
//! This module translates terminal events into application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use launchpad_core::SortMode;
use ratatui::layout::Position;

use crate::app::{App, AppState};

use super::layout;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle detail overlay
    if matches!(app.state, AppState::ShowingDetails) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => app.close_details(),
            KeyCode::Enter | KeyCode::Char('p') => app.play_details(),
            _ => {}
        }
        return Ok(false);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        match key.code {
            KeyCode::Esc => {
                app.clear_query();
                app.state = AppState::Normal;
            }
            KeyCode::Enter => {
                app.state = AppState::Normal;
            }
            KeyCode::Backspace => {
                app.pop_query_char();
            }
            KeyCode::Char(c) => {
                app.push_query_char(c);
            }
            KeyCode::Up => app.move_selection(0, -1),
            KeyCode::Down => app.move_selection(0, 1),
            _ => {}
        }
        return Ok(false);
    }

    // Normal mode
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Esc => {
            app.clear_query();
            app.status_message = None;
        }
        KeyCode::Char('s') | KeyCode::Tab => app.cycle_sort(),
        KeyCode::Char('S') | KeyCode::BackTab => app.cycle_sort_back(),
        KeyCode::Char('1') => app.set_sort(SortMode::Recent),
        KeyCode::Char('2') => app.set_sort(SortMode::Alpha),
        KeyCode::Char('3') => app.set_sort(SortMode::Plays),
        KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_selection(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(0, 1),
        KeyCode::PageUp => app.page(-1),
        KeyCode::PageDown => app.page(1),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char('p') => app.play_selected(),
        KeyCode::Char('d') => app.open_selected_details(),
        _ => {}
    }

    Ok(false)
}

/// Handle mouse input.
///
/// With the detail overlay open, a click outside its content closes it.
/// Otherwise a click selects a card, and a click on the selected card opens
/// its details.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {}
        MouseEventKind::ScrollDown if app.state == AppState::Normal => {
            app.move_selection(0, 1);
            return;
        }
        MouseEventKind::ScrollUp if app.state == AppState::Normal => {
            app.move_selection(0, -1);
            return;
        }
        _ => return,
    }

    let position = Position {
        x: mouse.column,
        y: mouse.row,
    };

    match app.state {
        AppState::ShowingDetails => {
            if !layout::detail(app.viewport).contains(position) {
                app.close_details();
            }
        }
        AppState::Normal | AppState::Searching => {
            let grid = layout::screen(app.viewport).grid;
            let hit = layout::card_at(grid, app.cards().len(), app.scroll_row, position.x, position.y);
            if let Some(card) = hit {
                if card == app.selection {
                    app.open_details(card);
                } else {
                    app.select(card);
                }
            }
        }
        _ => {}
    }
}
