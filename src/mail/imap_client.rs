use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use imap::types::{Fetch, Flag, NameAttribute};
use log::{debug, info, warn};
use native_tls::TlsConnector;
use std::collections::HashSet;

use crate::auth::Credentials;
use crate::config::AccountConfig;
use crate::domain::{DateRange, FieldError, Message};
use crate::mail::decoders::{
    address_of, body_text, decode_subject, display_name_of, join_recipients, parse_date_header,
    to_local,
};
use crate::mail::folders::FolderInfo;
use crate::mail::store::{FolderKind, MailStore};

type ImapSession = imap::Session<native_tls::TlsStream<std::net::TcpStream>>;

/// UIDs per FETCH command.
const FETCH_CHUNK: usize = 50;

/// Leading bytes of a received message fetched for classification. Text
/// parts come before attachments in practice; the rest is never downloaded.
const BODY_PREFIX_BYTES: usize = 64 * 1024;

const HEADER_ITEMS: &str = "(UID INTERNALDATE ENVELOPE)";
/// Sent copies only feed reply matching and recipients, so no body.
const SENT_ITEMS: &str = "(UID FLAGS INTERNALDATE ENVELOPE)";

fn fetch_items(kind: FolderKind) -> String {
    match kind {
        FolderKind::Received => format!(
            "(UID FLAGS INTERNALDATE ENVELOPE BODY.PEEK[]<0.{BODY_PREFIX_BYTES}>)"
        ),
        FolderKind::Sent => SENT_ITEMS.to_string(),
    }
}

/// Build canonical auth string as bytes.
fn build_xoauth2_bytes(user: &str, access_token: &str) -> Vec<u8> {
    format!("user={user}\x01auth=Bearer {access_token}\x01\x01").into_bytes()
}

struct OAuth2Authenticator {
    response: Vec<u8>,
}

impl imap::Authenticator for OAuth2Authenticator {
    type Response = Vec<u8>;
    fn process(&self, _challenge: &[u8]) -> Self::Response {
        self.response.clone()
    }
}

pub struct ImapClient {
    session: ImapSession,
    account: String,
}

impl ImapClient {
    /// Open a TLS session and log in. Any failure here is a connectivity
    /// failure and ends the run.
    pub fn connect(account: &AccountConfig, credentials: &Credentials) -> Result<Self> {
        let server = account.imap_server.as_str();
        info!("connecting to {}:{}", server, account.imap_port);
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect((server, account.imap_port), server, &tls)
            .with_context(|| format!("cannot reach {server}:{}", account.imap_port))?;

        let session = match credentials {
            Credentials::Password(password) => client
                .login(account.login(), password)
                .map_err(|(e, _)| anyhow!("login as {} failed: {e}", account.login()))?,
            Credentials::AccessToken(token) => xoauth2(client, account.login(), token)?,
        };

        Ok(Self {
            session,
            account: account.address.clone(),
        })
    }

    pub fn logout(mut self) -> Result<()> {
        self.session.logout()?;
        Ok(())
    }

    fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let mut uids: Vec<u32> = self.session.uid_search(query)?.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    /// Server side date filter.
    fn search_range(&mut self, kind: FolderKind, range: &DateRange) -> Result<Vec<u32>> {
        let query = match kind {
            FolderKind::Received => {
                format!("SINCE {} BEFORE {}", range.imap_since(), range.imap_before())
            }
            FolderKind::Sent => format!(
                "SENTSINCE {} SENTBEFORE {}",
                range.imap_since(),
                range.imap_before()
            ),
        };
        debug!("{}: UID SEARCH {query}", self.account);
        self.search(&query)
    }

    /// Manual date check, for servers that reject the date search.
    fn scan_range(&mut self, kind: FolderKind, range: &DateRange) -> Result<Vec<u32>> {
        let all = self.search("ALL")?;
        let mut keep = Vec::new();
        for (n, chunk) in all.chunks(FETCH_CHUNK).enumerate() {
            let fetches = self.session.uid_fetch(uid_set(chunk), HEADER_ITEMS)?;
            for f in fetches.iter() {
                let msg = message_from_fetch(f);
                let date = match kind {
                    FolderKind::Received => msg.received_date(),
                    FolderKind::Sent => msg.sent_date(),
                };
                match (f.uid, date) {
                    (Some(uid), Ok(d)) if range.contains(d) => keep.push(uid),
                    (_, Err(e)) => debug!("message skipped in date scan: {e}"),
                    _ => {}
                }
            }
            debug!(
                "scanned {} of {} message(s)",
                ((n + 1) * FETCH_CHUNK).min(all.len()),
                all.len()
            );
        }
        Ok(keep)
    }

    fn fetch_messages(&mut self, uids: &[u32], kind: FolderKind) -> Result<Vec<Message>> {
        let items = fetch_items(kind);
        let mut out = Vec::with_capacity(uids.len());
        let mut seen = HashSet::new();
        for chunk in uids.chunks(FETCH_CHUNK) {
            let fetches = self.session.uid_fetch(uid_set(chunk), &items)?;
            for f in fetches.iter() {
                if let Some(uid) = f.uid
                    && !seen.insert(uid)
                {
                    continue;
                }
                out.push(message_from_fetch(f));
            }
        }
        Ok(out)
    }
}

impl MailStore for ImapClient {
    fn list_folders(&mut self) -> Result<Vec<FolderInfo>> {
        let names = self.session.list(Some(""), Some("*"))?;
        let folders: Vec<FolderInfo> = names
            .iter()
            .map(|n| {
                let attrs: Vec<String> = n.attributes().iter().map(attribute_name).collect();
                let attrs: Vec<&str> = attrs.iter().map(String::as_str).collect();
                FolderInfo::new(n.name(), n.delimiter(), &attrs)
            })
            .collect();
        debug!("{} folder(s) listed", folders.len());
        Ok(folders)
    }

    fn messages_in_range(
        &mut self,
        folder: &FolderInfo,
        kind: FolderKind,
        range: &DateRange,
    ) -> Result<Vec<Message>> {
        // EXAMINE is read-only, so nothing is marked as seen
        let mailbox = self.session.examine(&folder.raw_name)?;
        debug!("{} has {} message(s)", folder.name, mailbox.exists);
        if mailbox.exists == 0 {
            return Ok(Vec::new());
        }

        let uids = match self.search_range(kind, range) {
            Ok(uids) => uids,
            Err(e) => {
                warn!("date search failed in {}: {e}, checking dates manually", folder.name);
                self.scan_range(kind, range)?
            }
        };
        self.fetch_messages(&uids, kind)
    }
}

fn xoauth2(
    client: imap::Client<native_tls::TlsStream<std::net::TcpStream>>,
    user: &str,
    access_token: &str,
) -> Result<ImapSession> {
    let raw_payload = build_xoauth2_bytes(user, access_token);

    // Try RAW first
    let auth_raw = OAuth2Authenticator {
        response: raw_payload.clone(),
    };
    let client = match client.authenticate("XOAUTH2", &auth_raw) {
        Ok(session) => return Ok(session),
        Err((e, returned_client)) => {
            debug!("raw XOAUTH2 attempt failed: {e}");
            returned_client
        }
    };

    // Fallback BASE64
    let b64_bytes = general_purpose::STANDARD.encode(&raw_payload).into_bytes();
    let auth_b64 = OAuth2Authenticator {
        response: b64_bytes,
    };
    match client.authenticate("XOAUTH2", &auth_b64) {
        Ok(session) => Ok(session),
        Err((e, _)) => Err(anyhow!("XOAUTH2 failed (raw+base64): {e}")),
    }
}

fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn attribute_name(attr: &NameAttribute<'_>) -> String {
    match attr {
        NameAttribute::NoInferiors => "\\Noinferiors".to_string(),
        NameAttribute::NoSelect => "\\Noselect".to_string(),
        NameAttribute::Marked => "\\Marked".to_string(),
        NameAttribute::Unmarked => "\\Unmarked".to_string(),
        NameAttribute::Custom(s) => s.to_string(),
    }
}

/// Turn one FETCH response into a message. Never fails as a whole: each
/// field carries its own error.
fn message_from_fetch(f: &Fetch) -> Message {
    let mut msg = Message {
        is_unread: Ok(!f.flags().iter().any(|fl| matches!(fl, Flag::Seen))),
        ..Message::default()
    };

    match f.internal_date() {
        Some(at) => msg.received_at = Ok(to_local(at)),
        None => msg.received_at = Err(FieldError::NotFetched("internal date")),
    }

    if let Some(env) = f.envelope() {
        msg.subject = Ok(env.subject.map(decode_subject).unwrap_or_default());

        let sender = env.from.as_ref().and_then(|froms| froms.first());
        msg.sender_address = Ok(sender.and_then(address_of).unwrap_or_default());
        msg.sender_name = Ok(sender.and_then(display_name_of).unwrap_or_default());

        msg.to = Ok(join_recipients(env.to.as_ref()));
        msg.cc = Ok(join_recipients(env.cc.as_ref()));

        msg.sent_at = match env.date {
            Some(raw) => parse_date_header(raw),
            None => Err(FieldError::NotFetched("date")),
        };
    }
    // sent copies without a usable Date: header were stored when sent
    if msg.sent_at.is_err()
        && let Ok(at) = msg.received_at
    {
        msg.sent_at = Ok(at);
    }

    msg.body = match f.body() {
        Some(raw) => body_text(raw),
        None => Err(FieldError::NotFetched("body")),
    };
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xoauth2_payload_layout() {
        assert_eq!(
            build_xoauth2_bytes("me@gmail.com", "tok"),
            b"user=me@gmail.com\x01auth=Bearer tok\x01\x01".to_vec()
        );
    }

    #[test]
    fn received_mail_fetches_a_bounded_body_prefix() {
        let items = fetch_items(FolderKind::Received);
        assert!(items.contains("BODY.PEEK[]<0.65536>"));
        assert!(!items.contains("BODY[]"));

        let sent = fetch_items(FolderKind::Sent);
        assert!(!sent.contains("BODY"));
        assert!(sent.contains("ENVELOPE"));
    }

    #[test]
    fn uid_sets_are_comma_separated() {
        assert_eq!(uid_set(&[3, 7, 42]), "3,7,42");
        assert_eq!(uid_set(&[]), "");
    }

    #[test]
    fn attribute_names_round_trip_special_use() {
        assert_eq!(attribute_name(&NameAttribute::NoSelect), "\\Noselect");
        assert_eq!(
            attribute_name(&NameAttribute::Custom("\\Sent".into())),
            "\\Sent"
        );
    }
}
