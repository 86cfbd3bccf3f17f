use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::terminal::state::ReportState;

/// Returns true when the view should close.
pub fn handle_key(key: KeyEvent, state: &mut ReportState) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => state.toggle_focus(),
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MessageAnalyzer;
    use crate::terminal::state::Focus;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        let mut s = ReportState::new(MessageAnalyzer::default().analyze(&[], &[]));
        assert!(handle_key(press(KeyCode::Char('q')), &mut s));
        assert!(handle_key(press(KeyCode::Esc), &mut s));
        assert!(!handle_key(press(KeyCode::Tab), &mut s));
        assert_eq!(s.focus, Focus::Recipients);
    }
}
