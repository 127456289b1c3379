//! Screen geometry shared by rendering, navigation and mouse hit testing.

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

/// Narrowest a card may get before the grid drops a column.
pub const CARD_MIN_WIDTH: u16 = 34;

/// Card height including borders: five content lines.
pub const CARD_HEIGHT: u16 = 7;

/// Detail overlay size
const DETAIL_WIDTH: u16 = 64;
const DETAIL_HEIGHT: u16 = 16;

/// Areas of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub controls: Rect,
    pub grid: Rect,
    pub status: Rect,
}

pub fn screen(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Search and sort
            Constraint::Min(0),    // Card grid
            Constraint::Length(2), // Status bar
        ])
        .split(area);

    ScreenLayout {
        title: chunks[0],
        controls: chunks[1],
        grid: chunks[2],
        status: chunks[3],
    }
}

pub fn columns_for(width: u16) -> usize {
    (width / CARD_MIN_WIDTH).max(1) as usize
}

pub fn visible_rows(height: u16) -> usize {
    (height / CARD_HEIGHT).max(1) as usize
}

/// Rectangles of the cards on screen, as `(position in view, rect)`.
pub fn card_rects(grid: Rect, count: usize, scroll_row: usize) -> Vec<(usize, Rect)> {
    let columns = columns_for(grid.width);
    let rows = visible_rows(grid.height);
    let card_width = grid.width / columns as u16;

    let mut rects = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            let position = (scroll_row + row) * columns + column;
            if position >= count {
                return rects;
            }
            let rect = Rect::new(
                grid.x + column as u16 * card_width,
                grid.y + row as u16 * CARD_HEIGHT,
                card_width,
                CARD_HEIGHT,
            );
            // Clip the last row to the grid
            rects.push((position, rect.intersection(grid)));
        }
    }
    rects
}

/// The card under a screen cell, if any.
pub fn card_at(grid: Rect, count: usize, scroll_row: usize, x: u16, y: u16) -> Option<usize> {
    card_rects(grid, count, scroll_row)
        .into_iter()
        .find(|(_, rect)| rect.contains(Position { x, y }))
        .map(|(position, _)| position)
}

/// Content rectangle of the detail overlay; everything else is backdrop.
pub fn detail(area: Rect) -> Rect {
    centered_rect_fixed(DETAIL_WIDTH, DETAIL_HEIGHT, area)
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_layout() {
        let layout = screen(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.title.height, 3);
        assert_eq!(layout.grid, Rect::new(0, 6, 100, 32));
        assert_eq!(layout.status.y, 38);
    }

    #[test]
    fn test_columns_for_width() {
        assert_eq!(columns_for(0), 1);
        assert_eq!(columns_for(33), 1);
        assert_eq!(columns_for(68), 2);
        assert_eq!(columns_for(120), 3);
    }

    #[test]
    fn test_card_rects_fill_rows() {
        let grid = Rect::new(0, 6, 100, 21);
        let rects = card_rects(grid, 10, 0);
        // Two columns of 50, three rows of 7
        assert_eq!(rects.len(), 6);
        assert_eq!(rects[0], (0, Rect::new(0, 6, 50, 7)));
        assert_eq!(rects[1], (1, Rect::new(50, 6, 50, 7)));
        assert_eq!(rects[5], (5, Rect::new(50, 20, 50, 7)));
    }

    #[test]
    fn test_card_rects_scrolled_and_short() {
        let grid = Rect::new(0, 0, 100, 21);
        let rects = card_rects(grid, 5, 1);
        let positions: Vec<usize> = rects.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![2, 3, 4]);
        assert_eq!(rects[0].1.y, 0);
    }

    #[test]
    fn test_card_at() {
        let grid = Rect::new(0, 6, 100, 21);
        assert_eq!(card_at(grid, 10, 0, 10, 7), Some(0));
        assert_eq!(card_at(grid, 10, 0, 60, 14), Some(3));
        assert_eq!(card_at(grid, 3, 0, 60, 14), None);
        assert_eq!(card_at(grid, 10, 0, 10, 2), None);
    }

    #[test]
    fn test_detail_rect_is_centered() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = detail(area);
        assert_eq!(rect, Rect::new(18, 12, 64, 16));
        // Small terminals clamp to the frame
        assert_eq!(detail(Rect::new(0, 0, 40, 10)), Rect::new(0, 0, 40, 10));
    }
}
