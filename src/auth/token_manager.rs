use anyhow::{Result, anyhow};
use log::{info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{oauth, token_store, tokens_file};
use crate::config::{AccountConfig, AuthMethod, OAuthConfig};

/// What the IMAP login needs for one account.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password(String),
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(..)"),
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

/// Expiry used when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3500;

#[derive(Clone)]
pub struct TokenManager {
    pub account: String,
    pub method: AuthMethod,
    pub oauth: Option<OAuthConfig>,
    pub client_secret: Option<String>,
}

impl TokenManager {
    pub fn for_account(account: &AccountConfig) -> Result<Self> {
        let client_secret = match &account.oauth {
            Some(o) => token_store::load_client_secret(&o.client_id)?
                .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok()),
            None => None,
        };

        Ok(Self {
            account: account.address.clone(),
            method: account.auth,
            oauth: account.oauth.clone(),
            client_secret,
        })
    }

    pub fn credentials(&self) -> Result<Credentials> {
        match self.method {
            AuthMethod::Password => self.password().map(Credentials::Password),
            AuthMethod::OAuth2 => self.access_token().map(Credentials::AccessToken),
        }
    }

    fn password(&self) -> Result<String> {
        if let Some(p) = token_store::load_password(&self.account)? {
            return Ok(p);
        }
        std::env::var("IMAP_PASSWORD").map_err(|_| {
            anyhow!(
                "no password stored for {}; run `rs_mail_stats set-password --account {}` or set IMAP_PASSWORD",
                self.account,
                self.account
            )
        })
    }

    /// Returns a valid access token; refreshes/PKCE if needed.
    fn access_token(&self) -> Result<String> {
        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| anyhow!("account {} has no oauth settings", self.account))?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        // 1) cached & not expired
        let cached = tokens_file::load_tokens()?;
        if let Some(at) = cached.valid_token(&self.account, now) {
            return Ok(at.to_string());
        }

        // 2) refresh if possible, 3) otherwise PKCE
        let tokens = match token_store::load_refresh_token(&self.account)? {
            Some(rt) => {
                info!("refreshing access token for {}", self.account);
                match oauth::refresh_access_token(oauth, self.client_secret.as_deref(), &rt) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("refresh failed: {e}, falling back to interactive auth");
                        oauth::perform_pkce_flow(oauth, self.client_secret.as_deref(), &self.account)?
                    }
                }
            }
            None => oauth::perform_pkce_flow(oauth, self.client_secret.as_deref(), &self.account)?,
        };

        if let Some(rt) = &tokens.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.account, rt)
        {
            warn!("couldn't save refresh token to keyring: {e}");
        }

        let exp = tokens
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_TOKEN_LIFETIME_SECS);
        if let Err(e) = tokens_file::store_token(&self.account, &tokens.access_token, exp) {
            warn!("couldn't save token cache: {e}");
        }
        Ok(tokens.access_token)
    }
}
