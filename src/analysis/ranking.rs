use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::domain::Message;

pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedIdentity {
    pub identity: String,
    pub count: usize,
}

/// Occurrence counter that remembers first-seen order for tie breaking.
#[derive(Debug, Default)]
pub struct FrequencyTally {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl FrequencyTally {
    pub fn add(&mut self, identity: &str) {
        match self.counts.get_mut(identity) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(identity.to_string(), 1);
                self.order.push(identity.to_string());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Highest counts first; equal counts keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<RankedIdentity> {
        let mut ranked: Vec<RankedIdentity> = self
            .order
            .iter()
            .map(|id| RankedIdentity {
                identity: id.clone(),
                count: self.counts.get(id).copied().unwrap_or_default(),
            })
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

pub fn tally_senders(received: &[Message]) -> FrequencyTally {
    let mut tally = FrequencyTally::default();
    for msg in received {
        match msg.sender_identity() {
            Some(sender) => tally.add(sender),
            None => debug!("message without a usable sender skipped"),
        }
    }
    tally
}

/// Split a `;` separated recipient list, dropping blanks.
pub fn split_recipients(field: &str) -> impl Iterator<Item = &str> {
    field.split(';').map(str::trim).filter(|r| !r.is_empty())
}

/// To and CC identities land in the same tally. A message with either list
/// unreadable contributes nothing.
pub fn tally_recipients(sent: &[Message]) -> FrequencyTally {
    let mut tally = FrequencyTally::default();
    for msg in sent {
        let (to, cc) = match (&msg.to, &msg.cc) {
            (Ok(to), Ok(cc)) => (to, cc),
            (Err(e), _) | (_, Err(e)) => {
                debug!("recipients skipped: {e}");
                continue;
            }
        };
        split_recipients(to)
            .chain(split_recipients(cc))
            .for_each(|r| tally.add(r));
    }
    tally
}

pub fn top_senders(received: &[Message]) -> Vec<RankedIdentity> {
    tally_senders(received).top(TOP_N)
}

pub fn top_recipients(sent: &[Message]) -> Vec<RankedIdentity> {
    tally_recipients(sent).top(TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(addr: &str) -> Message {
        Message::default().with_sender(Some(addr), None)
    }

    fn pairs(ranked: &[RankedIdentity]) -> Vec<(&str, usize)> {
        ranked.iter().map(|r| (r.identity.as_str(), r.count)).collect()
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let msgs: Vec<Message> = ["b", "a", "c", "a", "b", "d"].into_iter().map(from).collect();
        let top = top_senders(&msgs);
        assert_eq!(pairs(&top), vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn never_more_than_five() {
        let msgs: Vec<Message> = ["a", "b", "c", "d", "e", "f", "g", "g"]
            .into_iter()
            .map(from)
            .collect();
        let top = top_senders(&msgs);
        assert_eq!(top.len(), TOP_N);
        assert_eq!(top[0].identity, "g");
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn senders_without_identity_are_skipped() {
        let msgs = vec![
            Message::default(),
            Message::default().with_sender(None, Some("Ann")),
            Message::default().with_sender(Some(""), Some("")),
        ];
        assert_eq!(pairs(&top_senders(&msgs)), vec![("Ann", 1)]);
    }

    #[test]
    fn to_and_cc_merge_into_one_tally() {
        let sent = vec![
            Message::default().with_recipients("ann@x.org; bob@x.org", "ann@x.org"),
            Message::default().with_recipients(" ;bob@x.org;; ", ""),
        ];
        assert_eq!(
            pairs(&top_recipients(&sent)),
            vec![("ann@x.org", 2), ("bob@x.org", 2)]
        );
    }

    #[test]
    fn unreadable_cc_skips_the_message() {
        let mut broken = Message::default().with_recipients("ann@x.org", "");
        broken.cc = Err(crate::domain::FieldError::NotFetched("cc"));
        let ok = Message::default().with_recipients("bob@x.org", "");
        assert_eq!(pairs(&top_recipients(&[broken, ok])), vec![("bob@x.org", 1)]);
    }

    #[test]
    fn no_sent_messages_means_no_recipients() {
        assert!(top_recipients(&[]).is_empty());
        assert!(tally_recipients(&[]).is_empty());
    }
}
