use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::chat::Role;
use crate::config::SUGGESTED_PROMPTS;
use crate::ui_state::Focus;
use crate::visibility::SidebarState;

// Copper Sapphire Morning color palette
const BG_DARK: Color = Color::Rgb(12, 12, 16);           // Deep background
const BG_PANEL: Color = Color::Rgb(18, 18, 24);          // Slightly lighter for panels

// Sapphire blues
const SAPPHIRE: Color = Color::Rgb(101, 150, 243);       // #6596F3 - Primary accent
const CYAN_LIGHT: Color = Color::Rgb(178, 220, 226);     // #B2DCE2 - Light cyan

// Copper/warm tones
const COPPER: Color = Color::Rgb(138, 72, 38);           // #8A4826 - Copper
const TAN: Color = Color::Rgb(216, 180, 169);            // #D8B4A9 - Tan/beige

// Accent colors
const BURGUNDY: Color = Color::Rgb(204, 92, 68);         // #CC5C44 - Stop
const OLIVE: Color = Color::Rgb(131, 179, 102);          // #83B366 - Send

// Text colors
const TEXT_PRIMARY: Color = Color::Rgb(240, 240, 245);   // Near white
const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 190); // Light gray
const TEXT_MUTED: Color = Color::Rgb(105, 116, 133);     // #697485 - Medium gray

// Border colors (subtle)
const BORDER_DIM: Color = Color::Rgb(45, 50, 60);        // Dim border

/// First sidebar row (inside the border) holding a history entry.
const SIDEBAR_LIST_TOP: u16 = 4;
pub const INPUT_HEIGHT: u16 = 3;

/// What a click on the sidebar landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarHit {
    Toggle,
    NewChat,
    Entry(usize),
}

/// Rows each history entry occupies; expanded entries carry a detail line.
fn entry_height(app: &App) -> u16 {
    if app.visibility.sidebar().is_open() { 2 } else { 1 }
}

/// Map a terminal cell to a sidebar control. The sidebar is anchored at the
/// top-left corner of the screen.
pub fn sidebar_hit(app: &App, column: u16, row: u16) -> Option<SidebarHit> {
    if column >= app.sidebar_width() {
        return None;
    }
    match row {
        1 => Some(SidebarHit::Toggle),
        2 => Some(SidebarHit::NewChat),
        r if r >= SIDEBAR_LIST_TOP => {
            let index = ((r - SIDEBAR_LIST_TOP) / entry_height(app)) as usize;
            (index < app.store.history().len()).then_some(SidebarHit::Entry(index))
        }
        _ => None,
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    // Fill entire background
    let bg = Block::default().style(Style::default().bg(BG_DARK));
    frame.render_widget(bg, frame.area());

    let area = frame.area();
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.sidebar_width()),
            Constraint::Min(20),
        ])
        .split(area);

    draw_sidebar(frame, app, main_chunks[0]);
    draw_main(frame, app, main_chunks[1]);

    if app.showing_command_popup() {
        draw_command_popup(frame, app, main_chunks[1]);
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let open = app.visibility.sidebar().is_open();
    let focused = app.ui.focus == Focus::Sidebar;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { SAPPHIRE } else { BORDER_DIM }))
        .style(Style::default().bg(BG_PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let pinned = app.visibility.sidebar() == SidebarState::Expanded;
    let toggle_style = if pinned {
        Style::default().fg(BG_DARK).bg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_SECONDARY)
    };

    let mut lines: Vec<Line> = Vec::new();
    if open {
        lines.push(Line::from(vec![
            Span::styled(" ≡ ", toggle_style),
            Span::styled(" Chats", Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(vec![
            Span::styled(" + ", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(" New chat", Style::default().fg(TEXT_SECONDARY)),
        ]));
        lines.push(Line::from(Span::styled(
            " Recent",
            Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
        )));
    } else {
        lines.push(Line::from(Span::styled(" ≡ ", toggle_style)));
        lines.push(Line::from(Span::styled(" + ", Style::default().fg(COPPER).add_modifier(Modifier::BOLD))));
        lines.push(Line::from(""));
    }

    let text_width = inner.width.saturating_sub(3) as usize;
    let active = app.store.active_id();

    for (idx, chat) in app.store.history().iter().enumerate() {
        let is_selected = active == Some(&chat.id);
        let is_cursor = focused && app.ui.sidebar_cursor == idx;

        let marker_style = if is_selected {
            Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        let marker = if is_selected { " ● " } else { " ○ " };

        if !open {
            lines.push(Line::from(Span::styled(marker, marker_style)));
            continue;
        }

        let title_style = match (is_selected, is_cursor) {
            (_, true) => Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
            (false, false) => Style::default().fg(TEXT_SECONDARY),
        };
        lines.push(Line::from(vec![
            Span::styled(marker, marker_style),
            Span::styled(truncate(&chat.title, text_width), title_style),
        ]));

        // Selected or highlighted entries show their latest message
        let detail = if is_selected || is_cursor {
            truncate(&chat.last_message.replace('\n', " "), text_width)
        } else {
            chat.timestamp.with_timezone(&Local).format("%b %d").to_string()
        };
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(detail, Style::default().fg(TEXT_MUTED)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_main(frame: &mut Frame, app: &App, area: Rect) {
    let header_height = if app.visibility.header_visible() {
        app.config.header_height
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(3),
            Constraint::Length(1),            // Status line
            Constraint::Length(INPUT_HEIGHT),
        ])
        .split(area);

    if header_height > 0 {
        draw_header(frame, app, chunks[0]);
    }

    if app.showing_welcome() {
        draw_welcome(frame, app, chunks[1]);
    } else {
        draw_messages(frame, app, chunks[1]);
    }

    draw_status(frame, app, chunks[2]);
    draw_input(frame, app, chunks[3]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER_DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(inner);

    let title = Line::from(vec![
        Span::styled(" ◆ ", Style::default().fg(COPPER)),
        Span::styled(
            app.config.company_name.clone(),
            Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" AI Assistant", Style::default().fg(TEXT_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(title), halves[0]);

    let hints = Line::from(vec![
        Span::styled("^B", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
        Span::styled(" sidebar  ", Style::default().fg(TEXT_MUTED)),
        Span::styled("^N", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
        Span::styled(" new chat ", Style::default().fg(TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(hints).alignment(Alignment::Right), halves[1]);
}

fn draw_welcome(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("✦", Style::default().fg(COPPER))),
        Line::from(""),
        Line::from(Span::styled(
            format!("Welcome to {} AI Assistant", app.config.company_name),
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "I'm here to help you with questions, analysis, creative tasks, and more.",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(Span::styled(
            "How can I assist you today?",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Try these conversation starters:",
            Style::default().fg(TEXT_MUTED),
        )),
        Line::from(""),
    ];

    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
        let selected = app.ui.prompt_selection == Some(i);
        let style = if selected {
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC)
        };
        let indicator = if selected { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(indicator, Style::default().fg(COPPER)),
            Span::styled(format!("\"{}\"", prompt), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("↑/↓ pick a starter, Enter to send, or type ", Style::default().fg(TEXT_MUTED)),
        Span::styled("/help", Style::default().fg(SAPPHIRE)),
    ]));

    let welcome = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(welcome, area);
}

// Wrap on word boundaries using display width
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.width() + 1 + word.width() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            result.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
        }
    }
    if !current_line.is_empty() {
        result.push(current_line);
    }
    if result.is_empty() {
        result.push(String::new());
    }
    result
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + 2 > max_width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.ui.focus == Focus::Chat { SAPPHIRE } else { BORDER_DIM };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Rect {
        x: inner.x + 1,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height,
    };

    // Fixed-width label for alignment
    const LABEL_WIDTH: usize = 12;
    let indent: String = " ".repeat(LABEL_WIDTH);
    let content_width = (padded.width as usize).saturating_sub(LABEL_WIDTH);
    let ai_label = app.config.ai_name.to_lowercase();

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.messages() {
        let (label, label_style, content_style) = match msg.role {
            Role::User => (
                "you",
                Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD),
                Style::default().fg(TEXT_PRIMARY),
            ),
            Role::Assistant => (
                ai_label.as_str(),
                Style::default().fg(COPPER).add_modifier(Modifier::BOLD),
                Style::default().fg(TAN),
            ),
        };

        let formatted_label = format!("{:>width$} │ ", label, width = LABEL_WIDTH - 3);
        let mut is_first_line = true;
        for content_line in msg.content.lines() {
            for wrapped_line in wrap_text(content_line, content_width) {
                if is_first_line {
                    lines.push(Line::from(vec![
                        Span::styled(formatted_label.clone(), label_style),
                        Span::styled(wrapped_line, content_style),
                    ]));
                    is_first_line = false;
                } else {
                    lines.push(Line::from(vec![
                        Span::raw(indent.clone()),
                        Span::styled(wrapped_line, content_style),
                    ]));
                }
            }
        }

        let time = msg.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        lines.push(Line::from(vec![
            Span::raw(indent.clone()),
            Span::styled(time, Style::default().fg(TEXT_MUTED).add_modifier(Modifier::DIM)),
        ]));
        lines.push(Line::from(""));
    }

    if app.typing_in_view() {
        let dots = match (app.animation_frame / 15) % 4 {
            0 => ".  ",
            1 => ".. ",
            2 => "...",
            _ => " ..",
        };
        let formatted_label = format!("{:>width$} │ ", ai_label, width = LABEL_WIDTH - 3);
        lines.push(Line::from(vec![
            Span::styled(formatted_label, Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(format!("thinking{}", dots), Style::default().fg(COPPER).add_modifier(Modifier::ITALIC)),
        ]));
    }

    let total_lines = lines.len();
    let visible_height = padded.height as usize;

    // Scroll from the bottom; clamp scroll_offset to the valid range
    let max_scroll = total_lines.saturating_sub(visible_height);
    let clamped_offset = app.ui.scroll_offset.min(max_scroll);
    let scroll_pos = max_scroll.saturating_sub(clamped_offset);

    let messages = Paragraph::new(lines).scroll((scroll_pos as u16, 0));
    frame.render_widget(messages, padded);

    if total_lines > visible_height && area.width > 2 && area.height > 2 {
        if scroll_pos > 0 {
            let up_area = Rect { x: area.x + area.width - 2, y: area.y + 1, width: 1, height: 1 };
            frame.render_widget(Paragraph::new("▲").style(Style::default().fg(SAPPHIRE)), up_area);
        }
        if clamped_offset > 0 {
            let down_area = Rect { x: area.x + area.width - 2, y: area.y + area.height - 2, width: 1, height: 1 };
            frame.render_widget(Paragraph::new("▼").style(Style::default().fg(SAPPHIRE)), down_area);
        }
    }
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.ui.status_message {
        Some(message) => Line::from(Span::styled(format!(" {}", message), Style::default().fg(CYAN_LIGHT))),
        None => Line::from(vec![
            Span::styled(" ESC", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(" quit  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("/", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(" cmds  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("S-Tab", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(" focus", Style::default().fg(TEXT_MUTED)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.ui.focus == Focus::Input;
    let border_color = if focused {
        // Pulsing border when focused
        let glow = (app.animation_frame as f64 / 90.0).sin() * 0.3 + 0.7;
        Color::Rgb((101.0 * glow) as u8, (150.0 * glow) as u8, (243.0 * glow) as u8)
    } else {
        BORDER_DIM
    };

    let (button, button_color) = if app.is_typing() {
        (" ■ stop ", BURGUNDY)
    } else if app.ui.input.trim().is_empty() {
        (" ➤ send ", TEXT_MUTED)
    } else {
        (" ➤ send ", OLIVE)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title_bottom(Line::from(Span::styled(button, Style::default().fg(button_color))).right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = if app.ui.input.is_empty() {
        let placeholder = if focused { "Type for magic..." } else { "Your chats are private and secure" };
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(SAPPHIRE)),
            Span::styled(placeholder, Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC)),
        ])
    } else {
        let cursor = if focused && app.animation_frame % 30 < 15 { "|" } else { " " };
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(SAPPHIRE)),
            Span::styled(format!("{}{}", app.ui.input, cursor), Style::default().fg(TEXT_PRIMARY)),
        ])
    };

    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), inner);
}

fn draw_command_popup(frame: &mut Frame, app: &App, chat_area: Rect) {
    let filtered = app.get_filtered_commands();

    if filtered.is_empty() {
        return;
    }

    // +1 for the "your input" option, +2 for borders
    let popup_height = (filtered.len() + 3) as u16;
    let popup_width = 44.min(chat_area.width.saturating_sub(4));
    let popup_area = Rect {
        x: chat_area.x + 2,
        y: chat_area.y + chat_area.height.saturating_sub(popup_height + INPUT_HEIGHT + 1),
        width: popup_width,
        height: popup_height.min(chat_area.height),
    };

    // Clear area behind popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Commands ", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(COPPER))
        .style(Style::default().bg(BG_PANEL));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    // First option: current typed input (selected when command_selection is None)
    let input_selected = app.ui.command_selection.is_none();
    let input_style = if input_selected {
        Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_SECONDARY)
    };
    let indicator = if input_selected { ">" } else { " " };
    lines.push(Line::from(vec![
        Span::styled(format!("{} {} ", indicator, &app.ui.input), input_style),
        Span::styled("(your input)", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC)),
    ]));

    for (i, (cmd, desc)) in filtered.iter().enumerate() {
        let is_selected = app.ui.command_selection == Some(i);
        let style = if is_selected {
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_SECONDARY)
        };
        let indicator = if is_selected { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!("{} {} ", indicator, cmd), style),
            Span::styled(format!("- {}", desc), Style::default().fg(TEXT_MUTED)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("a long conversation title", 10);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 10);
    }

    #[test]
    fn test_welcome_screen_renders_prompts() {
        let app = App::new(Config::default(), Instant::now());
        let screen = render(&app);
        assert!(screen.contains("Welcome to Acme Corp AI Assistant"));
        assert!(screen.contains("Explain a complex concept"));
    }

    #[test]
    fn test_header_hidden_after_intro() {
        let mut app = App::new(Config::default(), Instant::now());
        assert!(render(&app).contains("^B"));
        app.visibility.pointer_moved(1_000);
        assert!(!render(&app).contains("^B"));
    }

    #[test]
    fn test_sidebar_hit_collapsed_and_expanded() {
        let mut app = App::new(Config::default(), Instant::now());
        assert_eq!(sidebar_hit(&app, 1, 1), Some(SidebarHit::Toggle));
        assert_eq!(sidebar_hit(&app, 1, 2), Some(SidebarHit::NewChat));
        assert_eq!(sidebar_hit(&app, 1, SIDEBAR_LIST_TOP), Some(SidebarHit::Entry(0)));
        assert_eq!(sidebar_hit(&app, 1, SIDEBAR_LIST_TOP + 1), None);
        assert_eq!(sidebar_hit(&app, 50, 1), None);

        app.toggle_sidebar();
        assert_eq!(sidebar_hit(&app, 20, SIDEBAR_LIST_TOP + 1), Some(SidebarHit::Entry(0)));
        assert_eq!(sidebar_hit(&app, 20, SIDEBAR_LIST_TOP + 2), None);
    }
}
