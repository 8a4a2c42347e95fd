use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use purpleglass_core::{ClickTarget, Focus, LoginOutcome, SubmitOutcome};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Reply(ready) => {
            app.chat.deliver_reply(ready);
        }
    }
    app.sync_scroll();
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::F(2) => {
            app.chat.toggle_settings();
            return;
        }
        KeyCode::Esc => {
            if !app.chat.escape() && app.chat.focus() == Focus::SettingsToggle {
                app.chat.set_focus(Focus::Composer);
            }
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(2) / 2);
            return;
        }
        _ => {}
    }

    match app.chat.focus() {
        Focus::LoginName => handle_login_key(app, key),
        Focus::Settings => handle_settings_key(app, key),
        Focus::SettingsToggle => handle_toggle_key(app, key),
        Focus::Composer => handle_composer_key(app, key),
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            if let Some(LoginOutcome::Rejected) = app.chat.login() {
                debug!("blank display name, prompting again");
            }
        }
        _ => {
            edit_focused_field(app, key);
        }
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.chat.settings_next(),
        KeyCode::Char('k') | KeyCode::Up => app.chat.settings_prev(),
        KeyCode::Enter | KeyCode::Char(' ') => app.chat.activate_setting(),
        KeyCode::Tab => app.chat.toggle_settings(),
        _ => {}
    }
}

fn handle_toggle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => app.chat.toggle_settings(),
        KeyCode::Tab | KeyCode::BackTab => app.chat.set_focus(Focus::Composer),
        _ => {}
    }
}

fn handle_composer_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let newline = key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
            if let Some(outcome) = app.chat.on_enter_key(newline) {
                log_submit(outcome);
            }
        }
        // Send affordance, available in both modes
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            log_submit(app.chat.submit());
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if app.chat.settings().is_some() {
                app.chat.set_focus(Focus::SettingsToggle);
            }
        }
        _ => {
            edit_focused_field(app, key);
        }
    }
}

fn log_submit(outcome: SubmitOutcome) {
    if outcome != SubmitOutcome::Sent {
        debug!(?outcome, "submit ignored");
    }
}

/// Apply an editing key to whichever text field has focus.
fn edit_focused_field(app: &mut App, key: KeyEvent) -> bool {
    let Some(field) = app.chat.focused_field_mut() else {
        return false;
    };
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => field.insert_char(c),
        KeyCode::Backspace => field.backspace(),
        KeyCode::Delete => field.delete(),
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Home => field.move_home(),
        KeyCode::End => field.move_end(),
        _ => return false,
    }
    app.chat.on_input();
    true
}

fn handle_paste(app: &mut App, text: &str) {
    let login = app.chat.focus() == Focus::LoginName;
    if let Some(field) = app.chat.focused_field_mut() {
        if login {
            // Single-line field
            field.insert_str(&text.replace(['\r', '\n'], " "));
        } else {
            field.insert_str(&text.replace("\r\n", "\n"));
        }
    }
    app.chat.on_input();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn hit(area: Option<Rect>, x: u16, y: u16) -> bool {
    area.is_some_and(|r| point_in_rect(x, y, r))
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::ScrollDown if hit(app.chat_area, x, y) => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp if hit(app.chat_area, x, y) => app.scroll_up(WHEEL_LINES),
        MouseEventKind::Down(MouseButton::Left) => handle_click(app, x, y),
        _ => {}
    }
}

fn handle_click(app: &mut App, x: u16, y: u16) {
    // The login overlay is modal
    if app.chat.overlay_visible() {
        return;
    }

    if hit(app.toggle_area, x, y) {
        app.chat.click(ClickTarget::Toggle);
        return;
    }

    if let Some(panel) = app.settings_area.filter(|r| point_in_rect(x, y, *r)) {
        app.chat.click(ClickTarget::Panel);
        // Rows start inside the top border
        if y > panel.y && y < panel.y + panel.height.saturating_sub(1) {
            app.chat.select_setting((y - panel.y - 1) as usize);
            app.chat.activate_setting();
        }
        return;
    }

    app.chat.click(ClickTarget::Outside);

    if hit(app.send_area, x, y) {
        log_submit(app.chat.submit());
    } else if hit(app.composer_area, x, y) {
        app.chat.set_focus(Focus::Composer);
    }
}
