//! Folder discovery: which mailboxes hold received mail and which one holds
//! sent mail.

use log::{debug, info};
use serde::Serialize;

pub const INBOX: &str = "INBOX";

/// Special-use folders that never hold received mail, even below the inbox.
const NOT_RECEIVED: &[&str] = &[
    "\\Sent",
    "\\Trash",
    "\\Drafts",
    "\\Junk",
    "\\All",
    "\\Flagged",
];

/// One entry of an IMAP `LIST` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderInfo {
    /// Name as the server spells it (modified UTF-7), used in commands.
    pub raw_name: String,
    /// Human readable name, used for matching and logs.
    pub name: String,
    pub delimiter: Option<String>,
    /// Flags such as `\Noselect` or the special-use `\Sent`.
    pub attributes: Vec<String>,
}

impl FolderInfo {
    pub fn new(raw_name: &str, delimiter: Option<&str>, attributes: &[&str]) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            name: crate::mail::decoders::decode_folder_name(raw_name),
            delimiter: delimiter.map(str::to_string),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn has_attribute(&self, attr: &str) -> bool {
        self.attributes.iter().any(|a| a.eq_ignore_ascii_case(attr))
    }

    pub fn selectable(&self) -> bool {
        !self.has_attribute("\\Noselect") && !self.has_attribute("\\NonExistent")
    }

    /// Last hierarchy segment, e.g. `Sent` for `[Gmail]/Sent`.
    pub fn leaf(&self) -> &str {
        match self.delimiter.as_deref() {
            Some(d) if !d.is_empty() => self.name.rsplit(d).next().unwrap_or(&self.name),
            _ => &self.name,
        }
    }

    fn holds_received_mail(&self) -> bool {
        !NOT_RECEIVED.iter().any(|a| self.has_attribute(a))
    }

    fn is_inbox(&self) -> bool {
        self.name.eq_ignore_ascii_case(INBOX)
    }

    fn is_under(&self, parent: &FolderInfo) -> bool {
        let Some(d) = self.delimiter.as_deref().filter(|d| !d.is_empty()) else {
            return false;
        };
        let prefix = format!("{}{}", parent.name, d);
        self.name.len() > prefix.len()
            && self
                .name
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
    }
}

/// The inbox followed by every selectable folder below it, minus the sent
/// folder and special-use folders. Without an inbox in the listing, the plain
/// `INBOX` mailbox is used.
pub fn inbox_tree(folders: &[FolderInfo], sent: Option<&FolderInfo>) -> Vec<FolderInfo> {
    let Some(inbox) = folders.iter().find(|f| f.is_inbox()) else {
        info!("no INBOX in folder listing, using the default inbox");
        return vec![FolderInfo::new(INBOX, None, &[])];
    };

    let mut tree = vec![inbox.clone()];
    tree.extend(
        folders
            .iter()
            .filter(|f| f.is_under(inbox) && f.selectable() && f.holds_received_mail())
            .filter(|f| sent.is_none_or(|s| s.raw_name != f.raw_name))
            .cloned(),
    );
    tree
}

/// Ways of finding the sent folder, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentFolderStrategy {
    /// Folder named in the account configuration.
    Configured(String),
    /// RFC 6154 `\Sent` special-use attribute.
    SpecialUse,
    /// Common names like `Sent` or `Sent Items`.
    ConventionalName,
    /// Anything whose name mentions sent mail.
    NameHeuristic,
}

const CONVENTIONAL_NAMES: &[&str] = &["sent", "sent items", "sent messages", "sent mail"];
const HEURISTIC_MARKERS: &[&str] = &["已发送", "寄件备份"];

impl SentFolderStrategy {
    pub fn find<'a>(&self, folders: &'a [FolderInfo]) -> Option<&'a FolderInfo> {
        let mut candidates = folders.iter().filter(|f| f.selectable());
        match self {
            Self::Configured(wanted) => candidates.find(|f| {
                f.name.eq_ignore_ascii_case(wanted) || f.raw_name.eq_ignore_ascii_case(wanted)
            }),
            Self::SpecialUse => candidates.find(|f| f.has_attribute("\\Sent")),
            Self::ConventionalName => candidates.find(|f| {
                let leaf = f.leaf().to_lowercase();
                CONVENTIONAL_NAMES.contains(&leaf.as_str())
            }),
            Self::NameHeuristic => candidates.find(|f| {
                f.name.to_lowercase().contains("sent")
                    || HEURISTIC_MARKERS.iter().any(|m| f.name.contains(m))
            }),
        }
    }
}

/// Strategy order for an account, with its configured folder first.
pub fn sent_strategies(configured: Option<&str>) -> Vec<SentFolderStrategy> {
    let mut strategies = Vec::with_capacity(4);
    if let Some(name) = configured.map(str::trim).filter(|n| !n.is_empty()) {
        strategies.push(SentFolderStrategy::Configured(name.to_string()));
    }
    strategies.extend([
        SentFolderStrategy::SpecialUse,
        SentFolderStrategy::ConventionalName,
        SentFolderStrategy::NameHeuristic,
    ]);
    strategies
}

/// First strategy that finds a folder wins.
pub fn resolve_sent_folder<'a>(
    strategies: &[SentFolderStrategy],
    folders: &'a [FolderInfo],
) -> Option<&'a FolderInfo> {
    strategies.iter().find_map(|s| {
        let found = s.find(folders);
        match found {
            Some(f) => info!("sent folder {} found by {:?}", f.name, s),
            None => debug!("sent folder strategy {:?} found nothing", s),
        }
        found
    })
}
