use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use imap_proto::types::Address;
use mailparse::{MailHeaderMap, ParsedMail};

use crate::domain::{Field, FieldError};

/// Wrap in a throwaway header so mailparse decodes RFC 2047 words.
fn decode_header_value(name: &[u8], raw: &[u8]) -> String {
    let mut line = name.to_vec();
    line.extend_from_slice(b": ");
    line.extend_from_slice(raw);
    line.extend_from_slice(b"\r\n");

    match mailparse::parse_header(&line) {
        Ok((h, _idx)) => h.get_value(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

pub fn decode_subject(raw: &[u8]) -> String {
    decode_header_value(b"Subject", raw)
}

pub fn decode_mime_words(raw: &[u8]) -> String {
    decode_header_value(b"X", raw)
}

/// IMAP mailbox names travel as modified UTF-7 (`&XfJT0ZAB-` is `已发送`).
pub fn decode_folder_name(raw: &str) -> String {
    utf7_imap::decode_utf7_imap(raw.to_string())
}

/// `mailbox@host` when both parts are present.
pub fn address_of(addr: &Address) -> Option<String> {
    let mailbox = addr.mailbox.map(decode_mime_words)?;
    let host = addr.host.map(decode_mime_words)?;
    let (mailbox, host) = (mailbox.trim(), host.trim());
    if mailbox.is_empty() || host.is_empty() {
        return None;
    }
    Some(format!("{mailbox}@{host}"))
}

pub fn display_name_of(addr: &Address) -> Option<String> {
    addr.name
        .map(decode_mime_words)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Recipients in the `a@x.org; Name B` form mail clients show, one entry per
/// address (falling back to the display name).
pub fn join_recipients(addrs: Option<&Vec<Address>>) -> String {
    addrs
        .map(|list| {
            list.iter()
                .filter_map(|a| address_of(a).or_else(|| display_name_of(a)))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default()
}

pub fn to_local(at: DateTime<FixedOffset>) -> NaiveDateTime {
    at.with_timezone(&Local).naive_local()
}

/// RFC 5322 `Date:` value as local time.
pub fn parse_date_header(raw: &[u8]) -> Field<NaiveDateTime> {
    let text = String::from_utf8_lossy(raw);
    let undecodable = |reason: String| FieldError::Undecodable {
        field: "date",
        reason,
    };
    let epoch = mailparse::dateparse(text.trim()).map_err(|e| undecodable(e.to_string()))?;
    DateTime::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .ok_or_else(|| undecodable(format!("timestamp {epoch} out of range")))
}

/// Best readable text of an RFC 822 message: first text/plain part, else
/// the first text/html part rendered to text.
pub fn body_text(raw_rfc822: &[u8]) -> Field<String> {
    let parsed = mailparse::parse_mail(raw_rfc822).map_err(|e| FieldError::Undecodable {
        field: "body",
        reason: e.to_string(),
    })?;

    if let Some(text) = find_part(&parsed, "text/plain") {
        return Ok(text);
    }
    if let Some(html) = find_part(&parsed, "text/html") {
        return Ok(html_to_text(&html));
    }
    // single part messages without a usable content type
    if parsed.subparts.is_empty() {
        return parsed.get_body().map_err(|e| FieldError::Undecodable {
            field: "body",
            reason: e.to_string(),
        });
    }
    Ok(String::new())
}

fn find_part(p: &ParsedMail, mime: &str) -> Option<String> {
    let is_attachment = p
        .headers
        .get_first_value("Content-Disposition")
        .is_some_and(|d| d.to_ascii_lowercase().starts_with("attachment"));
    if !is_attachment && p.ctype.mimetype.eq_ignore_ascii_case(mime) {
        return p.get_body().ok();
    }
    p.subparts.iter().find_map(|sp| find_part(sp, mime))
}

fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 100).unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_encoded_words() {
        assert_eq!(decode_subject(b"=?UTF-8?B?5om55YeG?="), "批准");
        assert_eq!(decode_subject(b"plain subject"), "plain subject");
        assert_eq!(decode_mime_words(b"=?ISO-8859-1?Q?Ren=E9?="), "René");
    }

    #[test]
    fn decodes_modified_utf7_folder_names() {
        assert_eq!(decode_folder_name("INBOX"), "INBOX");
        assert_eq!(decode_folder_name("&XfJT0ZAB-"), "已发送");
    }

    #[test]
    fn plain_text_part_wins() {
        let raw = b"Content-Type: multipart/alternative; boundary=b\r\n\r\n\
--b\r\nContent-Type: text/html\r\n\r\n<p>html</p>\r\n\
--b\r\nContent-Type: text/plain\r\n\r\nplain text\r\n--b--\r\n";
        assert_eq!(body_text(raw).unwrap().trim(), "plain text");
    }

    #[test]
    fn truncated_attachment_keeps_text_part() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
--b\r\nContent-Type: text/plain\r\n\r\nplease confirm\r\n\
--b\r\nContent-Type: application/pdf\r\nContent-Disposition: attachment\r\n\
Content-Transfer-Encoding: base64\r\n\r\nJVBERi0xLjQKJcfs";
        assert_eq!(body_text(raw).unwrap().trim(), "please confirm");
    }

    #[test]
    fn html_only_is_rendered() {
        let raw = b"Content-Type: text/html\r\n\r\n<p>Please <b>approve</b></p>\r\n";
        let text = body_text(raw).unwrap();
        assert!(text.contains("approve"), "{text}");
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn date_header_parses() {
        let at = parse_date_header(b"Tue, 1 Jul 2003 10:52:37 +0000").unwrap();
        let expected = DateTime::from_timestamp(1_057_056_757, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(at, expected);
    }

    #[test]
    fn recipients_prefer_addresses() {
        let a = Address {
            name: Some(&b"Ann"[..]),
            adl: None,
            mailbox: Some(&b"ann"[..]),
            host: Some(&b"x.org"[..]),
        };
        let b = Address {
            name: Some(&b"Bob"[..]),
            adl: None,
            mailbox: None,
            host: None,
        };
        assert_eq!(join_recipients(Some(&vec![a, b])), "ann@x.org; Bob");
        assert_eq!(join_recipients(None), "");
    }
}
