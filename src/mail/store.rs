use anyhow::Result;
use log::{info, warn};

use crate::domain::{DateRange, Message};
use crate::mail::folders::{self, FolderInfo};

/// Which date a folder is filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    /// Arrival time at the store.
    Received,
    /// The message's own `Date:`.
    Sent,
}

/// Access to one account's mailboxes.
pub trait MailStore {
    fn list_folders(&mut self) -> Result<Vec<FolderInfo>>;

    /// Messages of `folder` whose date falls inside `range`.
    fn messages_in_range(
        &mut self,
        folder: &FolderInfo,
        kind: FolderKind,
        range: &DateRange,
    ) -> Result<Vec<Message>>;
}

/// Everything one run analyses.
#[derive(Debug, Default)]
pub struct Mailboxes {
    pub received: Vec<Message>,
    pub sent: Vec<Message>,
}

/// Read the inbox tree and the sent folder. Only connectivity problems are
/// fatal upstream; here an unreadable folder is logged and skipped.
pub fn collect(
    store: &mut dyn MailStore,
    sent_folder: Option<&str>,
    range: &DateRange,
) -> Mailboxes {
    let listing = store.list_folders().unwrap_or_else(|e| {
        warn!("listing folders failed: {e}");
        Vec::new()
    });

    // resolved first so an `INBOX.Sent` style folder stays out of the inbox tree
    let strategies = folders::sent_strategies(sent_folder);
    let sent_box = folders::resolve_sent_folder(&strategies, &listing);

    let inbox = folders::inbox_tree(&listing, sent_box);
    info!("found {} inbox folder(s)", inbox.len());
    let received = read_folders(store, &inbox, FolderKind::Received, range);

    let sent = match sent_box {
        Some(folder) => read_folders(
            store,
            std::slice::from_ref(folder),
            FolderKind::Sent,
            range,
        ),
        None => {
            warn!("no sent folder found, skipping sent mail analysis");
            Vec::new()
        }
    };

    Mailboxes { received, sent }
}

fn read_folders(
    store: &mut dyn MailStore,
    folders: &[FolderInfo],
    kind: FolderKind,
    range: &DateRange,
) -> Vec<Message> {
    let mut out = Vec::new();
    for folder in folders {
        info!("reading folder {}", folder.name);
        match store.messages_in_range(folder, kind, range) {
            Ok(mut msgs) => {
                info!("  found {} message(s)", msgs.len());
                out.append(&mut msgs);
            }
            Err(e) => warn!("reading folder {} failed: {e}", folder.name),
        }
    }
    out
}
