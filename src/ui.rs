use purpleglass_core::{
    unescape_html, ChatMessage, ChatMode, ChatRole, Composer, Focus, SettingsItem, Theme,
};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState,
    },
    Frame,
};
use crate::app::App;

const SEND_WIDTH: u16 = 10;
const SETTINGS_WIDTH: u16 = 30;
const ASSISTANT_NAME: &str = "PurpleGlass";

/// Colours for one theme.
struct Palette {
    accent: Color,
    user: Color,
    assistant: Color,
    muted: Color,
    bar_bg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Glow => Self {
                accent: Color::Magenta,
                user: Color::LightMagenta,
                assistant: Color::LightCyan,
                muted: Color::DarkGray,
                bar_bg: Color::Rgb(48, 16, 64),
            },
            Theme::Midnight => Self {
                accent: Color::Blue,
                user: Color::LightBlue,
                assistant: Color::White,
                muted: Color::DarkGray,
                bar_bg: Color::Rgb(8, 16, 40),
            },
        }
    }
}

/// Turn a bubble's HTML fragment back into display text.
fn fragment_to_text(content: &str) -> String {
    let text = content
        .replace("<br>", "\n")
        .replace("</p>", "\n")
        .replace("<p>", "");
    unescape_html(text.trim_end_matches('\n'))
}

/// Greedy word wrap on character counts; overlong words are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw.split(' ') {
            let word_len = word.chars().count();
            let needed = if current_len == 0 {
                word_len
            } else {
                current_len + 1 + word_len
            };
            if needed <= width {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(word);
                current_len += word_len;
                continue;
            }

            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
            }
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > width {
                lines.push(chars.drain(..width).collect());
            }
            current = chars.into_iter().collect();
            current_len = current.chars().count();
        }

        lines.push(current);
    }

    lines
}

/// Hard wrap used by the composer, matching `Composer::fit_height`.
fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            rows.push(chunk.iter().collect());
        }
        // Room for the cursor after a line that fills the width
        if chars.len() % width == 0 {
            rows.push(String::new());
        }
    }
    rows
}

fn typing_dots(frame: u8) -> &'static str {
    match frame % 3 {
        0 => "●∙∙",
        1 => "∙●∙",
        _ => "∙∙●",
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.chat.theme());

    // Fit the composer to the width it will actually get before sizing it.
    let text_width = area.width.saturating_sub(SEND_WIDTH + 2);
    app.chat.set_composer_width(text_width.max(1));
    let max_rows = (area.height / 2).saturating_sub(2).max(1);
    let composer_rows = app.chat.composer().height().min(max_rows);

    // Main layout: header, chat, composer, footer
    let [header_area, chat_area, composer_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(composer_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);
    render_chat(app, frame, chat_area, &palette);
    render_composer(app, frame, composer_area, &palette);
    render_footer(app, frame, footer_area, &palette);

    // Popups (the login overlay sits above everything)
    if app.chat.settings_open() {
        render_settings_panel(app, frame, area, &palette);
    } else {
        app.settings_area = None;
    }

    if app.chat.overlay_visible() {
        render_login_overlay(app, frame, area, &palette);
    } else {
        app.overlay_area = None;
    }
}

fn render_header(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let bar = Style::default().bg(palette.bar_bg);
    let title = Line::from(vec![
        Span::styled(" ✦ PurpleGlass ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);

    let Some(label) = app.chat.display_label() else {
        frame.render_widget(Paragraph::new(title).style(bar), area);
        app.toggle_area = None;
        return;
    };

    let name = format!(" {} ", label);
    let expanded = app.chat.settings().map_or("false", |panel| panel.expanded_attr());
    let arrow = if expanded == "true" { "▴" } else { "▾" };
    let button = format!(" Settings {} ", arrow);
    let name_width = name.chars().count() as u16;
    let button_width = button.chars().count() as u16;

    let [title_area, name_area, toggle_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(name_width),
        Constraint::Length(button_width),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(title).style(bar), title_area);
    frame.render_widget(
        Paragraph::new(name).style(bar.fg(Color::White).add_modifier(Modifier::BOLD)),
        name_area,
    );

    let toggle_focused = matches!(app.chat.focus(), Focus::SettingsToggle | Focus::Settings);
    let toggle_style = if toggle_focused {
        Style::default().bg(palette.accent).fg(Color::White).bold()
    } else {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(button).style(toggle_style), toggle_area);
    app.toggle_area = Some(toggle_area);
}

fn message_lines(
    msg: &ChatMessage,
    width: usize,
    compact: bool,
    user_label: &str,
    animation_frame: u8,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let (color, label) = match msg.role {
        ChatRole::User => (palette.user, user_label.to_string()),
        ChatRole::Assistant => (palette.assistant, ASSISTANT_NAME.to_string()),
    };
    let bubble_style = Style::default().fg(color);
    let mut lines = Vec::new();

    if !compact {
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", msg.avatar())),
            Span::styled(label, bubble_style.add_modifier(Modifier::BOLD)),
        ]));
    }

    let body: Vec<String> = if msg.transient {
        vec![typing_dots(animation_frame).to_string()]
    } else {
        wrap_text(&fragment_to_text(&msg.content), width)
    };

    for (i, text) in body.into_iter().enumerate() {
        let prefix = if compact && i == 0 {
            format!("{} ", msg.avatar())
        } else {
            "   ".to_string()
        };
        let style = if msg.transient {
            bubble_style.add_modifier(Modifier::ITALIC)
        } else {
            bubble_style
        };
        lines.push(Line::from(vec![Span::raw(prefix), Span::styled(text, style)]));
    }

    if !compact {
        lines.push(Line::default());
    }
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Chat ");
    let inner = block.inner(area);
    app.chat_area = Some(area);

    if app.chat.messages().is_empty() {
        let placeholder = Paragraph::new("Say hello to PurpleGlass...")
            .style(Style::default().fg(palette.muted))
            .block(block);
        frame.render_widget(placeholder, area);
        app.update_chat_metrics(0, inner.height);
        return;
    }

    let width = inner.width.saturating_sub(4) as usize;
    let compact = app.chat.compact();
    let user_label = app.chat.display_label().unwrap_or("You").to_string();

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        lines.extend(message_lines(
            msg,
            width,
            compact,
            &user_label,
            app.animation_frame,
            palette,
        ));
    }

    let total = lines.len().min(u16::MAX as usize) as u16;
    app.update_chat_metrics(total, inner.height);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if app.total_chat_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state = ScrollbarState::new(app.max_scroll() as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_composer(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [input_area, send_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(SEND_WIDTH)]).areas(area);
    app.composer_area = Some(input_area);
    app.send_area = Some(send_area);

    let composer: &Composer = app.chat.composer();
    let enabled = composer.is_enabled();
    let focused = enabled && app.chat.focus() == Focus::Composer;

    let border_color = if focused {
        palette.accent
    } else {
        palette.muted
    };
    let title = if enabled {
        " Message "
    } else {
        " Sign in to chat "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = block.inner(input_area);

    // Keep the cursor row in view
    let (cursor_row, cursor_col) = composer.cursor_position(inner.width);
    let offset = cursor_row.saturating_sub(inner.height.saturating_sub(1));

    let rows: Vec<Line> = hard_wrap(composer.text(), inner.width as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    let text_style = if enabled {
        Style::default().fg(palette.user)
    } else {
        Style::default().fg(palette.muted)
    };
    let input = Paragraph::new(rows)
        .style(text_style)
        .block(block)
        .scroll((offset, 0));
    frame.render_widget(input, input_area);

    let can_send = enabled && !app.chat.reply_pending();
    let send_style = if can_send {
        Style::default().fg(Color::White).bg(palette.accent).bold()
    } else {
        Style::default().fg(palette.muted)
    };
    let send = Paragraph::new("Send ▶")
        .alignment(Alignment::Center)
        .style(send_style)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border_color)));
    frame.render_widget(send, send_area);

    if focused && !app.chat.overlay_visible() {
        frame.set_cursor_position((
            inner.x + cursor_col,
            inner.y + cursor_row - offset,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, hints) = match app.chat.focus() {
        Focus::LoginName => (
            " SIGN IN ",
            vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" continue ", label_style),
            ],
        ),
        Focus::Settings => (
            " SETTINGS ",
            vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" apply ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" close ", label_style),
            ],
        ),
        Focus::SettingsToggle => (
            " CHAT ",
            vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" settings ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" composer ", label_style),
            ],
        ),
        Focus::Composer => match app.chat.mode() {
            ChatMode::Gated => (
                " CHAT ",
                vec![
                    Span::styled(" Enter ", key_style),
                    Span::styled(" send ", label_style),
                    Span::styled(" Shift+Enter ", key_style),
                    Span::styled(" newline ", label_style),
                    Span::styled(" F2 ", key_style),
                    Span::styled(" settings ", label_style),
                    Span::styled(" PgUp/PgDn ", key_style),
                    Span::styled(" scroll ", label_style),
                ],
            ),
            ChatMode::Classic => (
                " CHAT ",
                vec![
                    Span::styled(" Ctrl+S ", key_style),
                    Span::styled(" send ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" newline ", label_style),
                    Span::styled(" PgUp/PgDn ", key_style),
                    Span::styled(" scroll ", label_style),
                ],
            ),
        },
    };

    let mode_style = Style::default().bg(palette.accent).fg(Color::White);
    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .chain([
            Span::styled(" Ctrl+C ", key_style),
            Span::styled(" quit ", label_style),
        ])
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_settings_panel(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let (Some(settings), Some(prefs)) = (app.chat.settings(), app.chat.preferences()) else {
        app.settings_area = None;
        return;
    };

    let items = SettingsItem::all();
    let width = SETTINGS_WIDTH.min(area.width);
    let height = (items.len() as u16 + 2).min(area.height.saturating_sub(1));

    // Drop down from the toggle, right-aligned with it
    let right = app
        .toggle_area
        .map(|t| t.x + t.width)
        .unwrap_or(area.x + area.width);
    let x = right.saturating_sub(width).max(area.x);
    let panel_area = Rect::new(x, area.y + 1, width, height);

    frame.render_widget(Clear, panel_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Settings ");

    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let text = match item {
                SettingsItem::Theme(theme) => format!(
                    " ({}) {} theme",
                    if prefs.theme == *theme { "•" } else { " " },
                    theme.display_name()
                ),
                SettingsItem::Compact => {
                    format!(" [{}] Compact mode", if prefs.compact { "x" } else { " " })
                }
                SettingsItem::Logout => " Log out".to_string(),
            };
            ListItem::new(text)
        })
        .collect();

    let list = List::new(list_items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.accent)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(settings.selected_index()));
    frame.render_stateful_widget(list, panel_area, &mut state);
    app.settings_area = Some(panel_area);
}

fn render_login_overlay(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let Some(session) = app.chat.session() else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = 52.min(area.width.saturating_sub(4));
    let popup_height = 8.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Welcome to PurpleGlass ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let intro = Paragraph::new("Pick a display name to start chatting.")
        .style(Style::default().fg(Color::White));
    frame.render_widget(intro, Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(1), 1));

    // Name field with horizontal scrolling
    let field_area = Rect::new(inner.x + 1, inner.y + 2, inner.width.saturating_sub(2), 1);
    let field = &session.name_field;
    let visible_width = field_area.width.saturating_sub(2) as usize;
    let cursor = field.cursor();
    let scroll_offset = if visible_width > 0 && cursor >= visible_width {
        cursor - visible_width + 1
    } else {
        0
    };
    let visible: String = field
        .text()
        .chars()
        .skip(scroll_offset)
        .take(visible_width)
        .collect();
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(palette.accent).bold()),
        Span::styled(visible, Style::default().fg(palette.user)),
    ]));
    frame.render_widget(input, field_area);

    let hint = Paragraph::new("Enter to continue")
        .style(Style::default().fg(palette.muted));
    frame.render_widget(hint, Rect::new(inner.x + 1, inner.y + 4, inner.width.saturating_sub(1), 1));

    if app.chat.focus() == Focus::LoginName {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((field_area.x + 2 + cursor_x, field_area.y));
    }

    app.overlay_area = Some(popup_area);
}
