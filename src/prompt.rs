//! Interactive console input for values missing from the command line.

use std::io::{BufRead, Write};

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::config::{AccountConfig, Config};
use crate::domain::parse_date;

pub const INVALID_DATE: &str = "invalid date, expected DD-MM-YYYY";

pub fn write_accounts(out: &mut impl Write, cfg: &Config) -> Result<()> {
    for (i, a) in cfg.accounts.iter().enumerate() {
        writeln!(out, "{}. {} ({})", i + 1, a.display_name, a.address)?;
    }
    Ok(())
}

/// One trimmed line. End of input is an error.
pub fn prompt_line(
    input: &mut impl BufRead,
    out: &mut impl Write,
    prompt: &str,
) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("input closed before a value was entered"));
    }
    Ok(line.trim().to_string())
}

/// Ask until a valid `DD-MM-YYYY` date is entered.
pub fn prompt_date(
    input: &mut impl BufRead,
    out: &mut impl Write,
    prompt: &str,
) -> Result<NaiveDate> {
    loop {
        match parse_date(&prompt_line(input, out, prompt)?) {
            Ok(d) => return Ok(d),
            Err(_) => writeln!(out, "{INVALID_DATE}")?,
        }
    }
}

/// Ask for an address and resolve it; unknown addresses fall back to the
/// first configured account.
pub fn prompt_account<'a>(
    input: &mut impl BufRead,
    out: &mut impl Write,
    cfg: &'a Config,
) -> Result<&'a AccountConfig> {
    let address = prompt_line(input, out, "Email address: ")?;
    cfg.find_account(&address)
        .ok_or_else(|| anyhow!("no accounts configured"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMethod;
    use std::io::Cursor;

    fn account(name: &str, address: &str) -> AccountConfig {
        AccountConfig {
            display_name: name.into(),
            address: address.into(),
            imap_server: "imap.example.com".into(),
            imap_port: 993,
            username: None,
            auth: AuthMethod::Password,
            oauth: None,
            sent_folder: None,
        }
    }

    fn config() -> Config {
        Config {
            accounts: vec![account("Work", "me@work.example"), account("Home", "me@home.example")],
            classifier: Default::default(),
        }
    }

    #[test]
    fn lists_accounts_numbered() {
        let mut out = Vec::new();
        write_accounts(&mut out, &config()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1. Work (me@work.example)\n2. Home (me@home.example)\n"
        );
    }

    #[test]
    fn date_prompt_repeats_until_valid() {
        let mut input = Cursor::new("2024-01-05\n31-02-2024\n05-01-2024\n");
        let mut out = Vec::new();
        let d = prompt_date(&mut input, &mut out, "Start date: ").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches(INVALID_DATE).count(), 2);
        assert_eq!(out.matches("Start date: ").count(), 3);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut out = Vec::new();
        assert!(prompt_date(&mut Cursor::new(""), &mut out, "Start date: ").is_err());
    }

    #[test]
    fn account_prompt_resolves_address() {
        let cfg = config();
        let mut out = Vec::new();
        let acct = prompt_account(&mut Cursor::new("  ME@home.example \n"), &mut out, &cfg).unwrap();
        assert_eq!(acct.display_name, "Home");
        assert!(String::from_utf8(out).unwrap().starts_with("Email address: "));
    }

    #[test]
    fn unknown_address_falls_back_to_first_account() {
        let cfg = config();
        let mut out = Vec::new();
        let acct = prompt_account(&mut Cursor::new("nobody@x.example\n"), &mut out, &cfg).unwrap();
        assert_eq!(acct.address, "me@work.example");
    }

    #[test]
    fn no_accounts_is_an_error() {
        let cfg = Config {
            accounts: Vec::new(),
            classifier: Default::default(),
        };
        let mut out = Vec::new();
        assert!(prompt_account(&mut Cursor::new("a@b\n"), &mut out, &cfg).is_err());
    }
}
