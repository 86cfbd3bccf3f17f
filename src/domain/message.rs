use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Why a single message field could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field `{0}` was not fetched")]
    NotFetched(&'static str),
    #[error("field `{field}` could not be decoded: {reason}")]
    Undecodable { field: &'static str, reason: String },
}

/// Every message attribute is read independently and may fail on its own.
pub type Field<T> = Result<T, FieldError>;

/// A message as handed over by the mail store.
///
/// Consumers pattern-match on each field: an `Err` means "skip this message
/// for this computation", never "abort the batch".
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub subject: Field<String>,
    pub body: Field<String>,
    pub is_unread: Field<bool>,
    pub received_at: Field<NaiveDateTime>,
    pub sent_at: Field<NaiveDateTime>,
    pub sender_address: Field<String>,
    pub sender_name: Field<String>,
    /// Semicolon-delimited, as mail clients display it.
    pub to: Field<String>,
    pub cc: Field<String>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            subject: Err(FieldError::NotFetched("subject")),
            body: Err(FieldError::NotFetched("body")),
            is_unread: Err(FieldError::NotFetched("flags")),
            received_at: Err(FieldError::NotFetched("received_at")),
            sent_at: Err(FieldError::NotFetched("sent_at")),
            sender_address: Err(FieldError::NotFetched("sender_address")),
            sender_name: Err(FieldError::NotFetched("sender_name")),
            to: Err(FieldError::NotFetched("to")),
            cc: Err(FieldError::NotFetched("cc")),
        }
    }
}

impl Message {
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Ok(subject.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Ok(body.into());
        self
    }

    pub fn with_unread(mut self, unread: bool) -> Self {
        self.is_unread = Ok(unread);
        self
    }

    pub fn with_received_at(mut self, at: NaiveDateTime) -> Self {
        self.received_at = Ok(at);
        self
    }

    pub fn with_sent_at(mut self, at: NaiveDateTime) -> Self {
        self.sent_at = Ok(at);
        self
    }

    pub fn with_sender(mut self, address: Option<&str>, name: Option<&str>) -> Self {
        self.sender_address = Ok(address.unwrap_or_default().to_string());
        self.sender_name = Ok(name.unwrap_or_default().to_string());
        self
    }

    pub fn with_recipients(mut self, to: impl Into<String>, cc: impl Into<String>) -> Self {
        self.to = Ok(to.into());
        self.cc = Ok(cc.into());
        self
    }

    pub fn received_date(&self) -> Field<NaiveDate> {
        self.received_at.as_ref().map(|at| at.date()).map_err(|e| e.clone())
    }

    pub fn sent_date(&self) -> Field<NaiveDate> {
        self.sent_at.as_ref().map(|at| at.date()).map_err(|e| e.clone())
    }

    /// Address when present and non-empty, otherwise the display name.
    pub fn sender_identity(&self) -> Option<&str> {
        non_empty(&self.sender_address).or_else(|| non_empty(&self.sender_name))
    }
}

fn non_empty(field: &Field<String>) -> Option<&str> {
    field.as_deref().ok().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_has_no_readable_fields() {
        let m = Message::default();
        assert_eq!(m.subject, Err(FieldError::NotFetched("subject")));
        assert!(m.is_unread.is_err());
        assert!(m.sender_identity().is_none());
    }

    #[test]
    fn sender_identity_prefers_address() {
        let m = Message::default().with_sender(Some("ann@example.com"), Some("Ann"));
        assert_eq!(m.sender_identity(), Some("ann@example.com"));
    }

    #[test]
    fn sender_identity_falls_back_to_name() {
        let m = Message::default().with_sender(Some("  "), Some("Ann"));
        assert_eq!(m.sender_identity(), Some("Ann"));

        let mut m = Message::default();
        m.sender_name = Ok("Bob".into());
        assert_eq!(m.sender_identity(), Some("Bob"));
    }

    #[test]
    fn received_date_drops_time_of_day() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let m = Message::default().with_received_at(at);
        assert_eq!(m.received_date(), Ok(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()));
        assert!(m.sent_date().is_err());
    }
}
