use std::cmp::min;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::{DateKey, Task};
use crate::settings::{Accent, AvatarColor, Background};

pub const BG_BASE: Color = Color::Rgb(14, 17, 23);
pub const BG_PANEL: Color = Color::Rgb(22, 26, 34);
pub const BG_ACCENT: Color = Color::Rgb(32, 37, 47);

pub fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Amber => Color::Rgb(245, 180, 60),
        Accent::Blue => Color::Rgb(120, 161, 255),
        Accent::Green => Color::Rgb(110, 200, 120),
        Accent::Purple => Color::Rgb(180, 140, 250),
        Accent::Rose => Color::Rgb(245, 120, 150),
        Accent::Slate => Color::Rgb(150, 165, 185),
        Accent::Orange => Color::Rgb(250, 145, 70),
        Accent::Teal => Color::Rgb(80, 200, 190),
    }
}

/// Terminal backgrounds stay dark; the preference only tints them.
pub fn background_color(background: Background) -> Color {
    match background {
        Background::Cream => Color::Rgb(24, 22, 18),
        Background::White => Color::Rgb(22, 22, 24),
        Background::Blue => Color::Rgb(14, 19, 30),
        Background::Green => Color::Rgb(14, 24, 18),
        Background::Purple => Color::Rgb(22, 16, 30),
        Background::Rose => Color::Rgb(30, 16, 22),
        Background::Amber => Color::Rgb(28, 22, 12),
        Background::Slate => BG_BASE,
    }
}

pub fn avatar_color(color: AvatarColor) -> Color {
    match color {
        AvatarColor::Blue => Color::Blue,
        AvatarColor::Green => Color::Green,
        AvatarColor::Purple => Color::Magenta,
        AvatarColor::Pink => Color::LightMagenta,
        AvatarColor::Indigo => Color::LightBlue,
        AvatarColor::Teal => Color::Cyan,
        AvatarColor::Orange => Color::LightRed,
        AvatarColor::Red => Color::Red,
    }
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = min(width, area.width);
    let h = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

pub fn inset_rect(area: Rect, padding: u16) -> Rect {
    if area.width == 0 || area.height == 0 {
        return area;
    }
    let px = padding.min(area.width / 2);
    let py = padding.min(area.height / 2);
    Rect {
        x: area.x + px,
        y: area.y + py,
        width: area.width.saturating_sub(px * 2),
        height: area.height.saturating_sub(py * 2),
    }
}

pub fn short_id(id: &str) -> String {
    let len = id.chars().count();
    id.chars().skip(len.saturating_sub(6)).collect()
}

pub fn day_label(date: DateKey) -> String {
    date.as_naive().format("%a %-d %b").to_string()
}

pub fn long_day_label(date: DateKey) -> String {
    date.as_naive().format("%A, %-d %B %Y").to_string()
}

/// Capture text that reproduces `task` when parsed again.
pub fn compose_task_capture(task: &Task) -> String {
    let mut components = vec![task.text.clone()];
    components.push(format!("on:{}", task.date));
    if let Some(time) = task.time {
        components.push(format!("at:{}", time));
    }
    if let Some(minutes) = task.notification.and_then(|n| n.lead_minutes()) {
        components.push(format!("remind:{}", minutes));
    }
    if task.is_private {
        components.push(String::from("!private"));
    }
    components.join(" ")
}

pub fn format_task_detail_entries(task: &Task) -> Vec<(String, String)> {
    let mut entries = vec![
        (String::from("Text"), task.text.clone()),
        (String::from("Day"), long_day_label(task.date)),
    ];
    if let Some(time) = task.time {
        entries.push((String::from("Time"), time.to_string()));
    }
    entries.push((
        String::from("Visibility"),
        String::from(if task.is_private { "private" } else { "public" }),
    ));
    match task.notification.and_then(|n| n.lead_minutes()) {
        Some(minutes) => entries.push((
            String::from("Reminder"),
            format!("{} min before", minutes),
        )),
        None if task.has_reminder() => {
            entries.push((String::from("Reminder"), String::from("on, no lead time")))
        }
        None => {}
    }
    if let Some(note) = &task.voice_note {
        entries.push((String::from("Voice note"), note.clone()));
    }
    entries.push((String::from("ID"), task.id.clone()));
    entries
}

pub fn build_help_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("j / k or ↓ / ↑", "Move the cursor (loads more days at the edges)"),
        ("J / K", "Next / previous day"),
        ("PgDn / PgUp", "Scroll a screen"),
        ("] / [", "Next / previous week"),
        ("t", "Back to today"),
        ("g", "Go to a date"),
        ("a", "Add a task on the selected day"),
        ("e", "Edit the selected task"),
        ("m / Space", "Pick up a task, then drop it on a day or a task"),
        ("> / <", "Move the task one day later / earlier"),
        ("p", "Toggle private"),
        ("r", "Toggle reminder"),
        ("x / Delete", "Delete task (with confirmation)"),
        ("Enter", "Task details"),
        ("/", "Search"),
        ("s", "Settings, sharing, and profile"),
        ("h / ?", "Toggle this help overlay"),
        ("Esc", "Cancel/close overlays"),
        ("q", "Quit"),
    ]
}

pub fn accent_title(text: &str, accent: Color) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_owned(),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    )])
}
