use std::io;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use rs_mail_stats::analysis::MessageAnalyzer;
use rs_mail_stats::auth::{TokenManager, token_store};
use rs_mail_stats::config::{AccountConfig, Config, load_config};
use rs_mail_stats::domain::{DateRange, parse_date};
use rs_mail_stats::prompt::{self, INVALID_DATE};
use rs_mail_stats::mail::{self, ImapClient};
use rs_mail_stats::report;
use rs_mail_stats::terminal::run_report_view;

#[derive(Parser)]
#[command(name = "rs_mail_stats")]
#[command(about = "Mailbox statistics over a date range", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured accounts
    Accounts,

    /// Analyse received and sent mail in a date range
    Analyze {
        /// First day, DD-MM-YYYY (prompted when missing)
        #[arg(long)]
        from: Option<String>,

        /// Last day, DD-MM-YYYY (prompted when missing)
        #[arg(long)]
        to: Option<String>,

        /// Account address (prompted when missing)
        #[arg(long)]
        account: Option<String>,

        /// Print the result as JSON
        #[arg(long, conflicts_with = "tui")]
        json: bool,

        /// Show the result in a terminal view
        #[arg(long)]
        tui: bool,
    },

    /// Store an IMAP password in keyring
    SetPassword {
        #[arg(long)]
        account: String,
    },

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted by user");
        std::process::exit(130);
    })?;

    let cli = Cli::parse();

    match cli.cmd {
        Command::Accounts => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            prompt::write_accounts(&mut io::stdout(), &cfg)
        }

        Command::Analyze {
            from,
            to,
            account,
            json,
            tui,
        } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout();
            if account.is_none() {
                println!("Available accounts:");
                prompt::write_accounts(&mut out, &cfg)?;
                println!();
            }
            let start = date_arg(&mut input, &mut out, from, "Start date (DD-MM-YYYY): ")?;
            let end = date_arg(&mut input, &mut out, to, "End date (DD-MM-YYYY): ")?;
            let range = DateRange::new(start, end)?;
            let acct = match account {
                Some(address) => cfg
                    .find_account(&address)
                    .ok_or_else(|| anyhow!("no accounts configured"))?,
                None => prompt::prompt_account(&mut input, &mut out, &cfg)?,
            };
            drop(input);
            analyze(&cfg, acct, range, json, tui)
        }

        Command::SetPassword { account } => {
            let password = read_secret("Paste password (end with Ctrl-D):")?;
            token_store::save_password(&account, &password)?;
            println!("Saved password for {}", account);
            Ok(())
        }

        Command::SetClientSecret { client_id } => {
            let secret = read_secret("Paste client secret (end with Ctrl-D):")?;
            token_store::save_client_secret(&client_id, &secret)?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }
    }
}

fn analyze(
    cfg: &Config,
    acct: &AccountConfig,
    range: DateRange,
    json: bool,
    tui: bool,
) -> Result<()> {
    info!("analysing {} ({})", acct.display_name, acct.address);

    let credentials = TokenManager::for_account(acct)?.credentials()?;
    let mut client = ImapClient::connect(acct, &credentials)?;
    let mailboxes = mail::store::collect(&mut client, acct.sent_folder.as_deref(), &range);
    client.logout()?;
    info!(
        "{} received and {} sent message(s) in range",
        mailboxes.received.len(),
        mailboxes.sent.len()
    );

    let result = MessageAnalyzer::new(cfg.keyword_rules())
        .analyze(&mailboxes.received, &mailboxes.sent)
        .for_account(acct.address.clone(), range);

    if tui {
        run_report_view(result).map_err(|e| anyhow!("terminal view failed: {e}"))
    } else if json {
        println!("{}", report::render_json(&result)?);
        Ok(())
    } else {
        print!("{}", report::render_text(&result));
        Ok(())
    }
}

/// Use the flag value when it parses, otherwise ask until a valid date is
/// entered.
fn date_arg(
    input: &mut impl io::BufRead,
    out: &mut impl io::Write,
    value: Option<String>,
    prompt: &str,
) -> Result<NaiveDate> {
    if let Some(v) = value {
        match parse_date(&v) {
            Ok(d) => return Ok(d),
            Err(_) => eprintln!("{INVALID_DATE}"),
        }
    }
    prompt::prompt_date(input, out, prompt)
}

fn read_secret(prompt: &str) -> Result<String> {
    eprintln!("{prompt}");
    let mut secret = String::new();
    io::Read::read_to_string(&mut io::stdin(), &mut secret)?;
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(anyhow!("nothing entered"));
    }
    Ok(secret.to_string())
}
