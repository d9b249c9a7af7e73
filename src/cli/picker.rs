//! Interactive page picker over a thumbnail grid.

use std::io::{stderr, Stderr};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use streamocr::thumbnails::ThumbnailGrid;

/// What a key press asks the picker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Confirm,
    Cancel,
}

/// Highlight position within the grid.
#[derive(Debug, Default)]
struct PickerState {
    cursor: usize,
}

impl PickerState {
    fn handle_key(&mut self, grid: &mut ThumbnailGrid<'_>, key: KeyEvent) -> Action {
        let last = grid.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Cancel,
            KeyCode::Esc | KeyCode::Char('q') => Action::Cancel,
            KeyCode::Enter => Action::Confirm,
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Action::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(last);
                Action::Continue
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.cursor = 0;
                Action::Continue
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.cursor = last;
                Action::Continue
            }
            KeyCode::Char(' ') => {
                if let Some(page) = grid.tiles().get(self.cursor).map(|t| t.page) {
                    grid.toggle(page);
                }
                Action::Continue
            }
            KeyCode::Char('a') => {
                grid.select_all();
                Action::Continue
            }
            KeyCode::Char('n') => {
                grid.deselect_all();
                Action::Continue
            }
            _ => Action::Continue,
        }
    }
}

/// Run the picker. Returns the summary when confirmed, `None` when dismissed.
///
/// Toggles are applied to the selection store as they happen, so a
/// dismissed picker still leaves them in place.
pub fn pick_pages(mut grid: ThumbnailGrid<'_>, title: &str) -> anyhow::Result<Option<String>> {
    let result = {
        let _screen = enter_picker_screen()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;
        run_picker_loop(&mut terminal, &mut grid, title)
    };

    match result? {
        Action::Confirm => Ok(Some(grid.confirm())),
        _ => {
            grid.close();
            Ok(None)
        }
    }
}

/// Runs `restore` when dropped, including on early `?` returns.
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = stderr().execute(LeaveAlternateScreen);
}

/// Raw mode plus the alternate screen, undone when the guard drops.
fn enter_picker_screen() -> anyhow::Result<TerminalGuard<fn()>> {
    enable_raw_mode()?;
    let guard = TerminalGuard {
        restore: restore_terminal as fn(),
    };
    stderr().execute(EnterAlternateScreen)?;
    Ok(guard)
}

fn run_picker_loop(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    grid: &mut ThumbnailGrid<'_>,
    title: &str,
) -> anyhow::Result<Action> {
    let mut state = PickerState::default();
    let poll_duration = Duration::from_millis(250);

    loop {
        terminal.draw(|frame| draw_picker(frame, grid, &state, title))?;

        if event::poll(poll_duration)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match state.handle_key(grid, key) {
                        Action::Continue => {}
                        action => return Ok(action),
                    }
                }
            }
        }
    }
}

fn draw_picker(frame: &mut Frame, grid: &ThumbnailGrid<'_>, state: &PickerState, title: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Pages
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let header = Paragraph::new(format!(
        "{}    {} of {} page(s) selected",
        title,
        grid.selected_count(),
        grid.len()
    ))
    .style(Style::default().bold())
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = grid
        .tiles()
        .iter()
        .map(|tile| {
            let mark = if tile.selected { "[x]" } else { "[ ]" };
            let style = if tile.selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} Page {:<5}", mark, tile.page), style),
                Span::styled(
                    format!("{}x{} px", tile.image.width, tile.image.height),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Pages"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default().with_selected(Some(state.cursor));
    frame.render_stateful_widget(list, chunks[1], &mut list_state);

    let footer = Paragraph::new(
        "↑/↓ move  space toggle  a all  n none  enter confirm  esc cancel",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[2]);
}
