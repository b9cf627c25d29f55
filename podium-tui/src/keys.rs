//! Keybinding definitions for the dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    MoveUp,
    MoveDown,
    Top,
    Bottom,
    /// Open the selected team.
    Open,
    Back,
    Refresh,
    Reconnect,
    OpenHelp,
}

pub fn map_key(event: KeyEvent) -> Option<KeyAction> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            KeyCode::Char('r') => Some(KeyAction::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(KeyAction::Quit),
        KeyCode::Char('?') => Some(KeyAction::OpenHelp),
        KeyCode::Char('r') => Some(KeyAction::Refresh),
        KeyCode::Char('c') => Some(KeyAction::Reconnect),
        KeyCode::Enter => Some(KeyAction::Open),
        KeyCode::Esc | KeyCode::Backspace => Some(KeyAction::Back),
        KeyCode::Tab => Some(KeyAction::NextView),
        KeyCode::BackTab => Some(KeyAction::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(KeyAction::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(KeyAction::MoveDown),
        KeyCode::Home | KeyCode::Char('g') => Some(KeyAction::Top),
        KeyCode::End | KeyCode::Char('G') => Some(KeyAction::Bottom),
        KeyCode::Char('1') => Some(KeyAction::SwitchView(0)),
        KeyCode::Char('2') => Some(KeyAction::SwitchView(1)),
        _ => None,
    }
}
