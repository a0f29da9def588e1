// TUI event loop and terminal management
use crate::{App, InputMode};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use storefront_core::Route;
use tracing::info;

/// Run until the user quits. Redraws at least every `tick_rate` so that
/// debounced searches and finished fetches show up without a keypress.
pub async fn run_tui(mut app: App, tick_rate: Duration) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, tick_rate);

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Leaving with {} favorites", app.favorites.len());
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| crate::ui::render(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Apply one keypress to the app
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match app.input_mode {
        InputMode::Searching => match key.code {
            KeyCode::Enter => app.submit_search(),
            KeyCode::Char(c) => app.push_search_char(c),
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Esc => app.enter_normal_mode(),
            KeyCode::Down => {
                app.enter_normal_mode();
                app.next_result();
            }
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('/') => app.enter_search_mode(),
            KeyCode::Char('x') => app.clear_search(),
            KeyCode::Char('c') => app.cycle_category(),
            KeyCode::Char('s') => app.cycle_sort(),
            KeyCode::Char('f') => app.toggle_selected_favorite(),
            KeyCode::Char('F') | KeyCode::Tab => app.toggle_favorites_screen(),
            KeyCode::Char('r') => app.retry(),
            KeyCode::Char('j') | KeyCode::Down => app.next_result(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_result(),
            KeyCode::Enter => match app.route {
                Route::Products | Route::Favorites => app.open_selected(),
                _ => {}
            },
            KeyCode::Esc | KeyCode::Backspace => app.back(),
            _ => {}
        },
    }
}
