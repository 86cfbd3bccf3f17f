//! Statistics over one batch of received and sent messages.
//!
//! Every pass isolates failures per message: a field that cannot be read
//! drops that message from the pass, never the batch.

pub mod classifier;
pub mod ranking;
pub mod read_status;
pub mod reply;

use serde::Serialize;

use crate::domain::{DateRange, Message};

pub use classifier::{Category, CategoryCounts, KeywordRule, KeywordRules};
pub use ranking::{RankedIdentity, TOP_N};
pub use read_status::ReadStatus;
pub use reply::normalize_subject;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub account: String,
    pub range: Option<DateRange>,
    pub total_received: usize,
    pub total_sent: usize,
    pub read_status: ReadStatus,
    pub replied: usize,
    pub same_day_replies: usize,
    pub top_senders: Vec<RankedIdentity>,
    pub top_recipients: Vec<RankedIdentity>,
    pub categories: CategoryCounts,
}

#[derive(Debug, Clone, Default)]
pub struct MessageAnalyzer {
    rules: KeywordRules,
}

impl MessageAnalyzer {
    pub fn new(rules: KeywordRules) -> Self {
        Self { rules }
    }

    pub fn analyze(&self, received: &[Message], sent: &[Message]) -> AnalysisResult {
        let replies = reply::match_replies(received, sent);

        AnalysisResult {
            account: String::new(),
            range: None,
            total_received: received.len(),
            total_sent: sent.len(),
            read_status: read_status::count_read_status(received),
            replied: replies.replied.len(),
            same_day_replies: replies.same_day,
            top_senders: ranking::top_senders(received),
            top_recipients: ranking::top_recipients(sent),
            categories: classifier::classify_all(&self.rules, received),
        }
    }
}

impl AnalysisResult {
    pub fn for_account(mut self, account: impl Into<String>, range: DateRange) -> Self {
        self.account = account.into();
        self.range = Some(range);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn on_day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_batch() {
        let r = MessageAnalyzer::default().analyze(&[], &[]);
        assert_eq!(r.total_received, 0);
        assert_eq!(r.read_status, ReadStatus::default());
        assert_eq!((r.replied, r.same_day_replies), (0, 0));
        assert!(r.top_senders.is_empty() && r.top_recipients.is_empty());
        assert_eq!(r.categories.total(), 0);
    }

    #[test]
    fn launch_reply_on_the_same_day() {
        let received = vec![
            Message::default()
                .with_subject("Re: Launch")
                .with_unread(false)
                .with_received_at(on_day(2)),
        ];
        let sent = vec![
            Message::default()
                .with_subject("Launch")
                .with_sent_at(on_day(2)),
        ];
        let r = MessageAnalyzer::default().analyze(&received, &sent);
        assert_eq!(r.replied, 1);
        assert_eq!(r.same_day_replies, 1);
        assert_eq!(r.read_status.read, 1);
    }

    #[test]
    fn urgent_confirm_needs_approval() {
        let received = vec![
            Message::default()
                .with_subject("URGENT: please confirm")
                .with_body(""),
        ];
        let r = MessageAnalyzer::default().analyze(&received, &[]);
        assert_eq!(r.categories.needs_approval, 1);
        assert_eq!(r.categories.needs_response, 0);
    }
}
