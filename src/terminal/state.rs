use ratatui::widgets::ListState;

use crate::analysis::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Senders,
    Recipients,
}

pub struct ReportState {
    pub result: AnalysisResult,
    pub focus: Focus,
    pub senders: ListState,
    pub recipients: ListState,
}

impl ReportState {
    pub fn new(result: AnalysisResult) -> Self {
        let mut s = Self {
            result,
            focus: Focus::Senders,
            senders: ListState::default(),
            recipients: ListState::default(),
        };
        if !s.result.top_senders.is_empty() {
            s.senders.select(Some(0));
        }
        if !s.result.top_recipients.is_empty() {
            s.recipients.select(Some(0));
        }
        s
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Senders => Focus::Recipients,
            Focus::Recipients => Focus::Senders,
        };
    }

    fn focused(&mut self) -> (&mut ListState, usize) {
        match self.focus {
            Focus::Senders => (&mut self.senders, self.result.top_senders.len()),
            Focus::Recipients => (&mut self.recipients, self.result.top_recipients.len()),
        }
    }

    pub fn move_selection(&mut self, delta: i32) {
        let (list, len) = self.focused();
        if len == 0 {
            list.select(None);
            return;
        }
        let cur = list.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        list.select(Some(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MessageAnalyzer;
    use crate::domain::Message;

    fn state() -> ReportState {
        let received: Vec<Message> = ["a@x", "b@x", "c@x"]
            .into_iter()
            .map(|s| Message::default().with_sender(Some(s), None))
            .collect();
        ReportState::new(MessageAnalyzer::default().analyze(&received, &[]))
    }

    #[test]
    fn selection_is_clamped() {
        let mut s = state();
        assert_eq!(s.senders.selected(), Some(0));
        s.move_selection(-1);
        assert_eq!(s.senders.selected(), Some(0));
        s.move_selection(10);
        assert_eq!(s.senders.selected(), Some(2));
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut s = state();
        s.toggle_focus();
        assert_eq!(s.focus, Focus::Recipients);
        s.move_selection(1);
        assert_eq!(s.recipients.selected(), None);
    }
}
