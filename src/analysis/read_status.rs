use log::debug;
use serde::Serialize;

use crate::domain::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReadStatus {
    pub read: usize,
    pub unread: usize,
    pub read_pct: f64,
    pub unread_pct: f64,
}

/// Tally read vs unread. Messages whose flags cannot be read are left out,
/// and percentages are taken over the messages that were counted.
pub fn count_read_status(received: &[Message]) -> ReadStatus {
    let mut status = ReadStatus::default();

    for msg in received {
        match msg.is_unread {
            Ok(true) => status.unread += 1,
            Ok(false) => status.read += 1,
            Err(ref e) => debug!("read status skipped: {e}"),
        }
    }

    let total = status.read + status.unread;
    if total > 0 {
        status.read_pct = status.read as f64 / total as f64 * 100.0;
        status.unread_pct = status.unread as f64 / total as f64 * 100.0;
    }
    status
}
