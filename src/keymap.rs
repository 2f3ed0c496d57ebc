use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::AppState;
use crate::bank::OptionKey;

/// Everything the shell can ask the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Answer(OptionKey),
    /// Answer with the highlighted option, or move on if already answered
    Confirm,
    HighlightUp,
    HighlightDown,
    Advance,
    Retreat,
    TogglePause,
    Review,
    Export,
    NewRun,
    Reset,
    Quit,
}

pub fn command_for(key: KeyEvent, state: AppState, paused: bool) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match state {
        AppState::Loading | AppState::LoadFailed => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        AppState::Welcome => match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(Command::Start),
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        AppState::Question if paused => match key.code {
            KeyCode::Char(' ') => Some(Command::TogglePause),
            KeyCode::Esc => Some(Command::Reset),
            _ => None,
        },
        AppState::Question => match key.code {
            KeyCode::Right => Some(Command::Advance),
            KeyCode::Left => Some(Command::Retreat),
            KeyCode::Up => Some(Command::HighlightUp),
            KeyCode::Down => Some(Command::HighlightDown),
            KeyCode::Enter => Some(Command::Confirm),
            KeyCode::Char(' ') => Some(Command::TogglePause),
            KeyCode::Esc => Some(Command::Reset),
            KeyCode::Char(c) => OptionKey::new(c).map(Command::Answer),
            _ => None,
        },
        AppState::Results => match key.code {
            KeyCode::Char('r') => Some(Command::Review),
            KeyCode::Char('x') => Some(Command::Export),
            KeyCode::Char('n') => Some(Command::NewRun),
            KeyCode::Esc => Some(Command::Reset),
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
    }
}
