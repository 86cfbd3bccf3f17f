use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "rs_mail_stats";

fn password_entry(account: &str) -> Result<Entry> {
    Ok(Entry::new(SERVICE, &format!("password:{account}"))?)
}

fn refresh_entry(account: &str) -> Result<Entry> {
    Ok(Entry::new(SERVICE, &format!("refresh:{account}"))?)
}

fn secret_entry(client_id: &str) -> Result<Entry> {
    Ok(Entry::new(SERVICE, &format!("client:{client_id}"))?)
}

fn load(entry: Entry) -> Result<Option<String>> {
    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// IMAP password for an account address
pub fn save_password(account: &str, password: &str) -> Result<()> {
    password_entry(account)?
        .set_password(password)
        .map_err(|e| anyhow!(e.to_string()))
}

pub fn load_password(account: &str) -> Result<Option<String>> {
    load(password_entry(account)?)
}

/// Save a refresh token into the OS keyring for the given account
pub fn save_refresh_token(account: &str, refresh_token: &str) -> Result<()> {
    refresh_entry(account)?
        .set_password(refresh_token)
        .map_err(|e| anyhow!(e.to_string()))
}

pub fn load_refresh_token(account: &str) -> Result<Option<String>> {
    load(refresh_entry(account)?)
}

/// Save a client secret into the keyring, keyed by client_id
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    secret_entry(client_id)?
        .set_password(client_secret)
        .map_err(|e| anyhow!(e.to_string()))
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    load(secret_entry(client_id)?)
}
