//! Dashboard themes and color utilities.

use podium_core::Movement;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub bg_secondary: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub gold: Color,
    pub silver: Color,
    pub bronze: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    pub fn podium() -> Self {
        Self {
            bg: Color::Rgb(12, 12, 20),
            bg_secondary: Color::Rgb(24, 24, 36),
            bg_highlight: Color::Rgb(40, 40, 60),
            primary: Color::Rgb(99, 102, 241),
            primary_dim: Color::Rgb(67, 56, 202),
            secondary: Color::Rgb(236, 72, 153),
            gold: Color::Rgb(250, 204, 21),
            silver: Color::Rgb(203, 213, 225),
            bronze: Color::Rgb(217, 119, 6),
            success: Color::Rgb(34, 197, 94),
            warning: Color::Rgb(234, 179, 8),
            error: Color::Rgb(239, 68, 68),
            info: Color::Rgb(56, 189, 248),
            text: Color::Rgb(241, 245, 249),
            text_dim: Color::Rgb(148, 163, 184),
            text_muted: Color::Rgb(71, 85, 105),
            border: Color::Rgb(51, 65, 85),
            border_focus: Color::Rgb(99, 102, 241),
        }
    }

    /// Terminal default palette for low-color terminals.
    pub fn mono() -> Self {
        Self {
            bg: Color::Reset,
            bg_secondary: Color::Reset,
            bg_highlight: Color::DarkGray,
            primary: Color::White,
            primary_dim: Color::Gray,
            secondary: Color::White,
            gold: Color::Yellow,
            silver: Color::Gray,
            bronze: Color::Red,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            text: Color::White,
            text_dim: Color::Gray,
            text_muted: Color::DarkGray,
            border: Color::Gray,
            border_focus: Color::White,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "podium" => Some(Self::podium()),
            "mono" => Some(Self::mono()),
            _ => None,
        }
    }
}

pub fn movement_color(movement: Movement, theme: &Theme) -> Color {
    match movement {
        Movement::Up(_) => theme.success,
        Movement::Down(_) => theme.error,
        Movement::New => theme.info,
        Movement::Unchanged => theme.text_muted,
    }
}

pub fn rank_color(rank: u32, theme: &Theme) -> Color {
    match rank {
        1 => theme.gold,
        2 => theme.silver,
        3 => theme.bronze,
        _ => theme.text_dim,
    }
}

pub fn connection_color(connected: bool, theme: &Theme) -> Color {
    if connected {
        theme.success
    } else {
        theme.warning
    }
}
