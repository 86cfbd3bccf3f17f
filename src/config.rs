use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{Category, KeywordRule, KeywordRules};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Password,
    OAuth2,
}

/// OAuth2 client registration used for XOAUTH2 logins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8080/callback".to_string()
}

fn default_scope() -> String {
    "https://mail.google.com/".to_string()
}

fn default_imap_port() -> u16 {
    993
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub display_name: String,
    pub address: String,
    pub imap_server: String,
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,
    /// Login name when it differs from the address.
    pub username: Option<String>,
    #[serde(default)]
    pub auth: AuthMethod,
    pub oauth: Option<OAuthConfig>,
    /// Explicit sent folder, tried before any detection.
    pub sent_folder: Option<String>,
}

impl AccountConfig {
    pub fn login(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.address)
    }
}

/// Replaces the built-in keyword lists when present.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub approval: Option<Vec<String>>,
    pub response: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Case-insensitive address lookup; unknown addresses fall back to the
    /// first configured account.
    pub fn find_account(&self, address: &str) -> Option<&AccountConfig> {
        let wanted = address.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|a| a.address.to_lowercase() == wanted)
            .or_else(|| {
                let fallback = self.accounts.first();
                if let Some(a) = fallback {
                    log::warn!("no account matches {address}, using {}", a.address);
                }
                fallback
            })
    }

    pub fn keyword_rules(&self) -> KeywordRules {
        let defaults = KeywordRules::default();
        let builtin = |cat: Category| {
            defaults
                .rules()
                .iter()
                .find(|r| r.category == cat)
                .cloned()
                .unwrap_or_else(|| KeywordRule::new::<&str>(cat, &[]))
        };
        let approval = match &self.classifier.approval {
            Some(words) => KeywordRule::new(Category::NeedsApproval, words),
            None => builtin(Category::NeedsApproval),
        };
        let response = match &self.classifier.response {
            Some(words) => KeywordRule::new(Category::NeedsResponse, words),
            None => builtin(Category::NeedsResponse),
        };
        KeywordRules::new(vec![approval, response])
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("rs_mail_stats"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn tokens_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("tokens.json");
    Ok(p)
}

fn sample_config() -> Config {
    Config {
        accounts: vec![AccountConfig {
            display_name: "Work".to_string(),
            address: "you@example.com".to_string(),
            imap_server: "imap.example.com".to_string(),
            imap_port: default_imap_port(),
            username: None,
            auth: AuthMethod::Password,
            oauth: None,
            sent_folder: None,
        }],
        classifier: ClassifierConfig::default(),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        // create a template config for users to edit
        let tom = toml::to_string_pretty(&sample_config())?;
        fs::write(path, tom)?;
        return Err(anyhow!(
            "Created template config at {}; edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    if cfg.accounts.is_empty() {
        return Err(anyhow!("no [[accounts]] configured in {}", path.display()));
    }
    for a in &cfg.accounts {
        if a.auth == AuthMethod::OAuth2 && a.oauth.is_none() {
            return Err(anyhow!(
                "account {} uses oauth2 but has no [accounts.oauth] section",
                a.address
            ));
        }
    }
    Ok(cfg)
}
