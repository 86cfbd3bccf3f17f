use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::tokens_path;

/// Non-secret access token cache stored next to config.toml, keyed by
/// account address.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokensFile {
    #[serde(default)]
    pub accounts: BTreeMap<String, CachedToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at_epoch: i64, // epoch seconds
}

impl TokensFile {
    /// Token for `account` that is still valid at `now`.
    pub fn valid_token(&self, account: &str, now: i64) -> Option<&str> {
        self.accounts
            .get(account)
            .filter(|t| now < t.expires_at_epoch)
            .map(|t| t.access_token.as_str())
    }
}

pub fn load_tokens_from(path: &Path) -> Result<TokensFile> {
    if !path.exists() {
        return Ok(TokensFile::default());
    }
    let s = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}

pub fn save_tokens_to(path: &Path, tokens: &TokensFile) -> Result<()> {
    let s = serde_json::to_string_pretty(tokens)?;
    fs::write(path, s)?;
    Ok(())
}

pub fn load_tokens() -> Result<TokensFile> {
    load_tokens_from(&tokens_path()?)
}

/// Record a fresh access token for one account, keeping the others.
pub fn store_token(account: &str, access_token: &str, expires_at_epoch: i64) -> Result<()> {
    let path = tokens_path()?;
    let mut tokens = load_tokens_from(&path)?;
    tokens.accounts.insert(
        account.to_string(),
        CachedToken {
            access_token: access_token.to_string(),
            expires_at_epoch,
        },
    );
    save_tokens_to(&path, &tokens)
}
