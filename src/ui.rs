use crate::core::PlayerSession;
use crate::model::{MediaKind, Theme};
use crate::playback::PlaybackState;
use crate::playlist::Playlist;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::time::Duration;

const APP_TITLE: &str = "mediadeck  ";

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    video: Color,
    selected_bg: Color,
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Light => ThemePalette {
            bg: Color::Rgb(242, 242, 242),
            panel_bg: Color::Rgb(255, 245, 245),
            border: Color::Rgb(204, 120, 120),
            text: Color::Rgb(20, 20, 20),
            muted: Color::Rgb(110, 110, 110),
            accent: Color::Rgb(196, 52, 52),
            alert: Color::Rgb(176, 110, 20),
            video: Color::Rgb(52, 96, 196),
            selected_bg: Color::Rgb(255, 229, 229),
        },
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(0, 0, 0),
            panel_bg: Color::Rgb(12, 12, 12),
            border: Color::Rgb(90, 90, 90),
            text: Color::Rgb(240, 240, 240),
            muted: Color::Rgb(150, 150, 150),
            accent: Color::Rgb(255, 110, 110),
            alert: Color::Rgb(235, 176, 97),
            video: Color::Rgb(140, 180, 255),
            selected_bg: Color::Rgb(40, 28, 28),
        },
    }
}

pub fn format_clock(position: Duration) -> String {
    let seconds = position.as_secs();
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn flag(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

pub fn draw(frame: &mut Frame, session: &PlayerSession, command: Option<&str>) {
    let colors = palette(session.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let state_label = match session.state() {
        PlaybackState::Idle => String::from("Idle"),
        PlaybackState::Playing(index) => format!("Playing {}", Playlist::display_index(index)),
        PlaybackState::Paused(index) => format!("Paused {}", Playlist::display_index(index)),
    };
    let folder_label = session
        .folder
        .as_ref()
        .map(|folder| folder.name())
        .unwrap_or_else(|| String::from("no folder"));

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(folder_label, Style::default().fg(colors.text)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(state_label, Style::default().fg(colors.alert)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!(
                "{} single  {} loop",
                flag(session.single_play()),
                flag(session.loop_mode())
            ),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(session.output_name(), Style::default().fg(colors.muted)),
    ]))
    .block(panel_block("Player", &colors));
    frame.render_widget(header, vertical[0]);

    let items: Vec<ListItem> = session
        .playlist
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let marker = match (entry.playing, entry.handle.is_paused()) {
                (true, false) => " > ",
                (true, true) => " = ",
                _ => "   ",
            };
            let kind_style = match entry.kind {
                MediaKind::Audio => Style::default().fg(colors.text),
                MediaKind::Video => Style::default().fg(colors.video),
            };
            let background = if session.is_background(index) {
                " bg"
            } else {
                "   "
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.accent)),
                Span::styled(
                    format!("{}  ", Playlist::display_index(index)),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(entry.display_name(), kind_style),
                Span::styled(
                    format!(
                        "  {} {}  {:>3}%{}",
                        entry.kind.label(),
                        format_clock(entry.handle.position()),
                        (entry.handle.volume() * 100.0).round() as u16,
                        background
                    ),
                    Style::default().fg(colors.muted),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!session.playlist.is_empty()).then_some(session.selected));

    let playlist_title = format!("Playlist ({})", session.playlist.len());
    let list = List::new(items)
        .block(panel_block(&playlist_title, &colors))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, vertical[1], &mut state);

    let status_text = match command {
        Some(buffer) => format!(":{buffer}"),
        None => session.status.clone(),
    };
    frame.render_widget(
        Paragraph::new(status_text)
            .style(Style::default().fg(colors.text))
            .block(panel_block("Status", &colors)),
        vertical[2],
    );

    frame.render_widget(
        Paragraph::new(
            "Enter play  Space pause  s stop  </> seek  K/J move  b background  x delete  1 single  l loop  d dark  : command  q quit",
        )
        .style(Style::default().fg(colors.muted))
        .block(panel_block("Keys", &colors)),
        vertical[3],
    );
}

fn panel_block<'a>(title: &'a str, colors: &ThemePalette) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(colors.text)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .style(Style::default().bg(colors.panel_bg))
}
