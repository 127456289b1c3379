use launchpad_core::overlay::{CLOSE_LABEL, PLAY_NOW_LABEL};
use launchpad_core::utils::truncate_string;
use launchpad_core::{DetailOverlay, ErrorPanel, GameCard, SortMode};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoadStatus};

use super::layout;
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let screen = layout::screen(frame.area());

    render_title_bar(frame, app, screen.title);
    render_controls(frame, app, screen.controls);
    render_main_content(frame, app, screen.grid);
    render_status_bar(frame, app, screen.status);

    // Render overlays
    if let Some(ref detail) = app.detail {
        render_detail_overlay(frame, detail);
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Launchpad";
    let site = format!(" {} ", app.settings.base);
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(site.clone(), styles::muted_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len() + site.chars().count() + help_hint.len() + 2),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let searching = matches!(app.state, AppState::Searching);
    let cursor = if searching { "_" } else { "" };

    let mut spans = vec![
        Span::styled(" [/] Search: ", styles::muted_style()),
        Span::styled(format!("{}{}", app.view.query, cursor), styles::search_style()),
    ];

    let sort_width: usize = SortMode::ALL
        .iter()
        .map(|mode| mode.label().len() + 3)
        .sum::<usize>()
        + "[s] Sort: ".len();
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    spans.push(Span::raw(
        " ".repeat((area.width as usize).saturating_sub(used + sort_width + 1)),
    ));

    spans.push(Span::styled("[s] Sort: ", styles::muted_style()));
    for (i, mode) in SortMode::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(mode.label(), styles::tab_style(*mode == app.view.sort)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style(searching));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.load_status {
        LoadStatus::Loading => render_notice(frame, area, "Loading games..."),
        LoadStatus::Failed(ref panel) => render_error_panel(frame, area, panel),
        LoadStatus::Loaded if app.cards().is_empty() => {
            let notice = if app.store().is_empty() {
                "The manifest lists no games".to_string()
            } else {
                format!("No games match \"{}\"", app.view.query.trim())
            };
            render_notice(frame, area, &notice);
        }
        LoadStatus::Loaded => render_grid(frame, app, area),
    }
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str) {
    let rect = layout::centered_rect_fixed(area.width, 1, area);
    let paragraph = Paragraph::new(Span::styled(text.to_string(), styles::muted_style()))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, rect);
}

fn render_error_panel(frame: &mut Frame, area: Rect, panel: &ErrorPanel) {
    let width = area.width.saturating_sub(4).min(76);
    let rect = layout::centered_rect_fixed(width, 7 + panel.hints.len() as u16, area);

    let mut lines = vec![
        Line::from(Span::styled(panel.headline.clone(), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(panel.message.clone(), styles::error_style())),
        Line::from(""),
    ];
    for hint in &panel.hints {
        lines.push(Line::from(vec![
            Span::styled(" • ", styles::muted_style()),
            Span::styled(hint.clone(), styles::list_item_style()),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, rect);
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let cards = app.cards();
    for (position, rect) in layout::card_rects(area, cards.len(), app.scroll_row) {
        render_card(frame, &cards[position], rect, position == app.selection);
    }
}

fn render_card(frame: &mut Frame, card: &GameCard, area: Rect, selected: bool) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut meta = vec![Span::styled(format!(" {} ", card.badge), styles::badge_style())];
    if !card.duration.is_empty() {
        meta.push(Span::styled(format!("  {}", card.duration), styles::muted_style()));
    }

    let lines = vec![
        Line::from(meta),
        Line::from(Span::styled(
            truncate_string(&card.description, inner_width),
            styles::list_item_style(),
        )),
        Line::from(Span::styled(
            truncate_string(&card.thumbnail, inner_width),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" Play  ", styles::help_desc_style()),
            Span::styled("[d]", styles::help_key_style()),
            Span::styled(" Details", styles::help_desc_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(selected))
        .title(Span::styled(
            format!(" {} ", truncate_string(&card.title, inner_width.saturating_sub(2))),
            if selected {
                styles::title_style()
            } else {
                styles::list_item_style()
            },
        ))
        .style(if selected {
            styles::selected_style()
        } else {
            Style::default()
        });

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/] search | [s]ort | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        match app.load_status {
            LoadStatus::Loaded => format!(
                " {} of {} games ",
                app.cards().len(),
                app.store().len()
            ),
            LoadStatus::Loading => " Loading ".to_string(),
            LoadStatus::Failed(_) => " Load failed ".to_string(),
        }
    };

    let right_text = match app.cache_status {
        Some(ref cache) => format!(" {} | {} ", cache, shortcuts),
        None => format!(" {} ", shortcuts),
    };

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let left_style = if app.status_message.is_some() {
        styles::highlight_style()
    } else if matches!(app.load_status, LoadStatus::Loaded) {
        styles::success_style()
    } else {
        styles::muted_style()
    };

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_detail_overlay(frame: &mut Frame, detail: &DetailOverlay) {
    // Dim the page, then draw the content on top
    frame.render_widget(Block::default().style(styles::backdrop_style()), frame.area());

    let area = layout::detail(frame.area());
    frame.render_widget(Clear, area);

    let mut tags = Vec::new();
    for tag in &detail.tags {
        tags.push(Span::styled(format!(" {} ", tag), styles::badge_style()));
        tags.push(Span::raw(" "));
    }

    let mut lines = vec![
        Line::from(Span::styled(detail.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(detail.description.clone(), styles::list_item_style())),
        Line::from(""),
    ];
    if !tags.is_empty() {
        lines.push(Line::from(tags));
        lines.push(Line::from(""));
    }
    if !detail.plays.is_empty() {
        lines.push(Line::from(Span::styled(detail.plays.clone(), styles::muted_style())));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("[Enter/p] ", styles::help_key_style()),
        Span::styled(PLAY_NOW_LABEL, styles::help_desc_style()),
        Span::raw("    "),
        Span::styled("[Esc/c] ", styles::help_key_style()),
        Span::styled(CLOSE_LABEL, styles::help_desc_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Details ", styles::muted_style()))
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn help_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc.to_string(), styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = layout::centered_rect_fixed(52, 23, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Launchpad", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("←↑↓→ hjkl", "Move between cards"),
        help_line("PgUp/PgDn", "Scroll a screen"),
        help_line("Home/End", "First/last game"),
        help_line("Click", "Select; click again for details"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("Enter/p", "Play"),
        help_line("d", "Details"),
        help_line("/", "Search by title or tag"),
        help_line("s/S", "Next/previous sort order"),
        help_line("1-3", "Newest, A-Z, most played"),
        help_line("Esc", "Clear search or close"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = layout::centered_rect_fixed(40, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LaunchSettings;
    use launchpad_core::{Game, GameStore, ManifestError, Url};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use std::path::PathBuf;

    fn new_app() -> App {
        let mut app = App::new(LaunchSettings {
            base: Url::parse("https://games.example/").expect("url"),
            inline_manifest: None,
            offline_cache: false,
            cache_root: PathBuf::from("/tmp/launchpad-test"),
            cache_name: "test-v1".to_string(),
            core_assets: Vec::new(),
            sort: SortMode::Alpha,
            query: String::new(),
        });
        app.set_viewport(Rect::new(0, 0, 100, 40));
        app
    }

    fn app_with(json: &str) -> App {
        let mut app = new_app();
        let games: Vec<Game> = serde_json::from_str(json).expect("test games");
        app.apply_manifest(Ok(GameStore::new(games)));
        app
    }

    fn draw(app: &App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        terminal.draw(|f| render(f, app)).expect("draw");
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    const GAMES: &str = r#"[
        {"id":"z","title":"Zeta","path":"games/zeta/","tags":["Puzzle"]},
        {"id":"a","title":"Alpha","path":"games/alpha/","description":"First up.","tags":["Arcade","Space"],"plays":1520}
    ]"#;

    #[test]
    fn test_grid_shows_cards_in_order() {
        let app = app_with(GAMES);
        let screen = text(&draw(&app));
        let alpha = screen.find("Alpha").expect("Alpha drawn");
        let zeta = screen.find("Zeta").expect("Zeta drawn");
        assert!(alpha < zeta);
        assert!(screen.contains("Arcade"));
        assert!(screen.contains("https://dummyimage.com/640x360"));
        assert!(screen.contains("2 of 2 games"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let app = app_with(GAMES);
        assert_eq!(draw(&app), draw(&app));
    }

    #[test]
    fn test_error_panel_replaces_grid() {
        let mut app = new_app();
        app.apply_manifest(Err(ManifestError::NotAnArray {
            path: "games/games.json".to_string(),
        }));
        let screen = text(&draw(&app));
        assert!(screen.contains("No games found"));
        assert!(screen.contains("Manifest is not an array"));
    }

    #[test]
    fn test_no_match_notice() {
        let mut app = app_with(GAMES);
        for c in "nothing".chars() {
            app.push_query_char(c);
        }
        let screen = text(&draw(&app));
        assert!(screen.contains("No games match \"nothing\""));
        assert!(!screen.contains("Zeta"));
    }

    #[test]
    fn test_detail_overlay_drawn() {
        let mut app = app_with(GAMES);
        app.open_details(0);
        let screen = text(&draw(&app));
        assert!(screen.contains("First up."));
        assert!(screen.contains("Space"));
        assert!(screen.contains("1.5k plays"));
        assert!(screen.contains("Play now"));
    }
}
