use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, DetailTab, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.detail.is_some() {
        handle_detail_key(app, key);
        return;
    }

    // If search input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Transactions),
        KeyCode::Char('2') => app.set_view(View::SqlLogs),
        KeyCode::Char('3') => app.set_view(View::Charts),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') if app.current_view != View::Transactions => {
            app.next_view()
        }

        // Expand/collapse children
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => app.toggle_expand(),

        // Row navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Pagination
        KeyCode::Char('n') => app.next_page(),
        KeyCode::Char('p') => app.prev_page(),
        KeyCode::Char('g') => app.first_page(),
        KeyCode::Char('G') => app.last_page(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.cycle_page_size(true),
        KeyCode::Char('-') => app.cycle_page_size(false),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Filters
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('f') => app.cycle_status_filter(),
        KeyCode::Char('o') => app.cycle_propagation_filter(),
        KeyCode::Char('i') => app.cycle_isolation_filter(),
        KeyCode::Char('x') => app.cycle_connection_filter(),
        KeyCode::Char('c') => app.clear_filters(),

        // Sorting
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),

        KeyCode::Char('r') => {
            app.refresh();
            app.set_status_message("Refreshing...".to_string());
        }
        KeyCode::Char('t') => app.fetch_threshold(),

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => match app.export_transactions() {
            Ok(path) => app.set_status_message(format!("Exported to {}", path.display())),
            Err(e) => app.set_status_message(format!("Export failed: {}", e)),
        },

        _ => {}
    }
}

/// Handle keys while the detail overlay is open
fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
            app.close_overlay();
        }
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.cycle_tab(true),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.cycle_tab(false),
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.select_tab(DetailTab::ALL[index]);
        }
        KeyCode::Up | KeyCode::Char('k') => app.scroll_detail(false),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_detail(true),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
}

/// Handle key input while search is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.apply_filter(),

        // Cancel search (keep the applied one)
        KeyCode::Esc => app.cancel_filter(),

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filters();
        }

        KeyCode::Backspace => app.filter_pop(),

        KeyCode::Char(c) => app.filter_push(c),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            if app.detail.is_some() {
                app.scroll_detail(false);
            } else {
                app.select_prev();
            }
        }
        MouseEventKind::ScrollDown => {
            if app.detail.is_some() {
                app.scroll_detail(true);
            } else {
                app.select_next();
            }
        }

        MouseEventKind::Down(MouseButton::Left) if app.detail.is_none() => {
            let clicked_row = mouse.row;

            // Rows below the table's header line
            if clicked_row > content_start_row {
                let item_row = (clicked_row - content_start_row - 1) as usize;
                match app.current_view {
                    View::Transactions => {
                        if item_row < app.transaction_rows().len() {
                            app.selected_tx_index = item_row;
                        }
                    }
                    View::SqlLogs => {
                        if item_row < app.data.sql_log_rows().len() {
                            app.selected_sql_index = item_row;
                        }
                    }
                    View::Charts => {}
                }
            }

            // Tab bar sits right under the header line
            if clicked_row == 1 {
                let col = mouse.column;
                // Approximate tab positions: Transactions (0-17), SQL Logs (18-31), Charts (32-42)
                if col < 18 {
                    app.set_view(View::Transactions);
                } else if col < 32 {
                    app.set_view(View::SqlLogs);
                } else if col < 43 {
                    app.set_view(View::Charts);
                }
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DashboardData;
    use crate::source::FileSource;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(
            Box::new(FileSource::new("/nonexistent/dump.json")),
            DashboardData::default(),
        )
    }

    #[test]
    fn test_view_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.current_view, View::Charts);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Transactions);
        handle_key_event(&mut app, key(KeyCode::Left));
        assert_eq!(app.current_view, View::Charts);
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.current_view, View::Transactions);
        // on the transactions view → expands instead of switching
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.current_view, View::Transactions);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_search_input() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter_active);
        for c in "abq".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }
        handle_key_event(&mut app, key(KeyCode::Backspace));
        // 'q' is text while typing, not quit
        assert!(app.running);
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(!app.filter_active);
        assert_eq!(app.tx_query.search, "ab");
    }

    #[test]
    fn test_filter_and_page_size_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('f')));
        assert!(app.tx_query.status.is_some());
        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert!(app.tx_query.status.is_none());
        handle_key_event(&mut app, key(KeyCode::Char('+')));
        assert_eq!(app.tx_query.size, 25);
    }
}
