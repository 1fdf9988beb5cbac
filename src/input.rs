use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    Top,
    Bottom,
    GPrefix,
    PageDown,
    PageUp,
    ToggleHelp,
    StartCreate,
    StartImageEdit,
    StartCommand,
    Deploy,
    Destroy,
    CheckStatus,
    Dismiss,
    SubmitInput,
    CompleteInput,
    NextSuggestion,
    PrevSuggestion,
    CancelInput,
    Backspace,
    DeleteWord,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::CreateNamespace | InputMode::Image | InputMode::Command => {
            map_input_mode_key(key)
        }
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') => Some(Action::GPrefix),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Home => Some(Action::Top),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char(':') => Some(Action::StartCommand),
        KeyCode::Char(';') if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(Action::StartCommand)
        }
        KeyCode::Char('c') => Some(Action::StartCreate),
        KeyCode::Char('i') => Some(Action::StartImageEdit),
        KeyCode::Char('d') => Some(Action::Deploy),
        KeyCode::Char('x') => Some(Action::Destroy),
        KeyCode::Char('s') | KeyCode::Char('r') | KeyCode::F(5) | KeyCode::Enter => {
            Some(Action::CheckStatus)
        }
        KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('y') => Some(Action::Dismiss),
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::SubmitInput)
        }
        KeyCode::Tab => Some(Action::CompleteInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Down => Some(Action::NextSuggestion),
        KeyCode::Up => Some(Action::PrevSuggestion),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::DeleteWord)
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::NextSuggestion)
        }
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PrevSuggestion)
        }
        _ => None,
    }
}
