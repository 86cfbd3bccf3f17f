use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use log::debug;
use regex::Regex;

use crate::domain::Message;

static REPLY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(re:|回复:|回覆:)\s*").expect("reply marker pattern is valid")
});

/// Lower-case the subject and strip one leading reply marker.
///
/// This is the key used to correlate received and sent messages.
pub fn normalize_subject(subject: Option<&str>) -> String {
    let lowered = subject.unwrap_or_default().to_lowercase();
    REPLY_MARKER.replace(&lowered, "").into_owned()
}

#[derive(Debug, Default)]
pub struct ReplyMatches<'a> {
    pub replied: Vec<&'a Message>,
    pub same_day: usize,
}

/// Normalized subject -> dates on which something with that subject was sent.
fn index_sent(sent: &[Message]) -> HashMap<String, Vec<NaiveDate>> {
    let mut index: HashMap<String, Vec<NaiveDate>> = HashMap::new();

    for msg in sent {
        let subject = match &msg.subject {
            Ok(s) => s,
            Err(e) => {
                debug!("sent message skipped for reply index: {e}");
                continue;
            }
        };
        let date = match msg.sent_date() {
            Ok(d) => d,
            Err(e) => {
                debug!("sent message skipped for reply index: {e}");
                continue;
            }
        };
        index
            .entry(normalize_subject(Some(subject)))
            .or_default()
            .push(date);
    }
    index
}

/// Find received messages that were answered by something in `sent`.
///
/// Unread messages are never counted. A match on the same calendar day is
/// counted at most once per received message.
pub fn match_replies<'a>(received: &'a [Message], sent: &[Message]) -> ReplyMatches<'a> {
    let mut matches = ReplyMatches::default();
    if sent.is_empty() {
        debug!("no sent messages, reply matching skipped");
        return matches;
    }

    let index = index_sent(sent);

    for msg in received {
        match msg.is_unread {
            Ok(false) => {}
            Ok(true) => continue,
            Err(ref e) => {
                debug!("received message skipped for reply matching: {e}");
                continue;
            }
        }

        let subject = match &msg.subject {
            Ok(s) => normalize_subject(Some(s)),
            Err(e) => {
                debug!("received message skipped for reply matching: {e}");
                continue;
            }
        };
        let received_on = match msg.received_date() {
            Ok(d) => d,
            Err(e) => {
                debug!("received message skipped for reply matching: {e}");
                continue;
            }
        };

        let Some(sent_dates) = index.get(&subject) else {
            continue;
        };
        matches.replied.push(msg);
        if sent_dates.iter().any(|d| *d == received_on) {
            matches.same_day += 1;
        }
    }
    matches
}
