use anyhow::{Result, anyhow};
use log::{debug, warn};
use oauth2::TokenResponse;
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenUrl,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

use crate::auth::token_store;
use crate::config::OAuthConfig;

/// Tokens returned by the oauth flow (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

fn basic_client(cfg: &OAuthConfig, client_secret: Option<&str>) -> Result<BasicClient> {
    let client_id = ClientId::new(cfg.client_id.clone());
    let client_secret = client_secret.map(|s| ClientSecret::new(s.to_string()));
    let auth_url = AuthUrl::new(cfg.auth_url.clone())?;
    let token_url = TokenUrl::new(cfg.token_url.clone())?;
    Ok(BasicClient::new(
        client_id,
        client_secret,
        auth_url,
        Some(token_url),
    ))
}

/// Exchange a refresh token for a new access token using the oauth2 crate
pub fn refresh_access_token(
    cfg: &OAuthConfig,
    client_secret: Option<&str>,
    refresh_token: &str,
) -> Result<Tokens> {
    let oauth_client = basic_client(cfg, client_secret)?;

    let rt = RefreshToken::new(refresh_token.to_string());
    let token = oauth_client
        .exchange_refresh_token(&rt)
        .request(http_client)?;

    let access = token.access_token().secret().to_string();
    let refresh = token.refresh_token().map(|r| r.secret().to_string());
    let expires = token.expires_in().map(|d| d.as_secs());

    Ok(Tokens {
        access_token: access,
        refresh_token: refresh,
        expires_in: expires,
    })
}

/// Perform Authorization Code + PKCE flow. Opens system browser and captures code via tiny server.
pub fn perform_pkce_flow(
    cfg: &OAuthConfig,
    client_secret: Option<&str>,
    account: &str,
) -> Result<Tokens> {
    let redirect_uri = cfg.redirect_uri.as_str();

    // Parse redirect_uri so bind address matches exactly
    let redirect = Url::parse(redirect_uri)
        .map_err(|e| anyhow!("Invalid redirect_uri '{redirect_uri}': {e}"))?;

    let host = redirect
        .host_str()
        .ok_or_else(|| anyhow!("redirect_uri missing host: {redirect_uri}"))?;

    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| anyhow!("redirect_uri missing/unknown port: {redirect_uri}"))?;

    // For local loopback flows, prefer binding explicitly to loopback.
    // If redirect host is "localhost" or "127.0.0.1", bind to 127.0.0.1.
    let bind_ip: IpAddr = match host {
        "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
        // If user put a specific IP, try it.
        other => other.parse::<IpAddr>().map_err(|_| {
            anyhow!("redirect_uri host must be localhost/127.0.0.1 or an IP: {other}")
        })?,
    };

    let bind_addr = SocketAddr::new(bind_ip, port);

    // 1) Start listening FIRST (fixes the race)
    let server = Server::http(bind_addr)
        .map_err(|e| anyhow!("Failed to bind OAuth callback server on {bind_addr}: {e:?}"))?;

    // 2) Configure client
    let oauth_client = basic_client(cfg, client_secret)?
        .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?);

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (auth_url, csrf_token) = oauth_client
        .authorize_url(oauth2::CsrfToken::new_random)
        .add_scope(Scope::new(cfg.scope.clone()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Authorize {account} by opening this URL in your browser:\n{auth_url}");
    // best-effort: don't fail if browser can't be opened
    if let Err(e) = open::that(auth_url.as_str()) {
        warn!("could not open browser automatically: {e}");
    }

    // 3) Wait for callback
    let base = format!("http://{host}:{port}");
    let code = wait_for_code(&server, &base, csrf_token.secret(), CALLBACK_TIMEOUT)?;

    // 4) Exchange code for tokens
    let token = match oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
    {
        Ok(tok) => tok,
        Err(err) => {
            debug!("token exchange error: {err:#?}");
            return Err(anyhow!("Token exchange failed for {account}: {err}"));
        }
    };

    let access = token.access_token().secret().to_string();
    let refresh = token.refresh_token().map(|r| r.secret().to_string());
    let expires = token.expires_in().map(|d| d.as_secs());

    if let Some(ref_token) = &refresh
        && let Err(e) = token_store::save_refresh_token(account, ref_token)
    {
        warn!("could not store refresh token in keyring: {e}");
    }

    Ok(Tokens {
        access_token: access,
        refresh_token: refresh,
        expires_in: expires,
    })
}

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// What the redirect carried.
#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Code(String),
    Denied(String),
    Ignored,
}

/// Inspect a redirect request path such as `/callback?code=..&state=..`.
fn parse_callback(base: &str, path_and_query: &str, expected_state: &str) -> Callback {
    let Ok(parsed) = Url::parse(&format!("{base}{path_and_query}")) else {
        return Callback::Ignored;
    };
    let mut code = None;
    let mut state = None;
    for (k, v) in parsed.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            "error" => return Callback::Denied(v.into_owned()),
            _ => {}
        }
    }
    match (code, state) {
        (Some(code), Some(state)) if state == expected_state => Callback::Code(code),
        (Some(_), _) => {
            warn!("ignoring OAuth callback with mismatched state");
            Callback::Ignored
        }
        _ => Callback::Ignored,
    }
}

fn wait_for_code(
    server: &Server,
    base: &str,
    expected_state: &str,
    timeout: Duration,
) -> Result<String> {
    let wait_until = Instant::now() + timeout;

    while Instant::now() < wait_until {
        let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };

        match parse_callback(base, request.url(), expected_state) {
            Callback::Code(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            Callback::Denied(reason) => {
                let _ = request.respond(Response::from_string(
                    "Authorization was denied. You can close this tab.",
                ));
                return Err(anyhow!("authorization denied: {reason}"));
            }
            Callback::Ignored => {
                let _ = request.respond(Response::from_string(
                    "No code found in redirect. You can close this tab.",
                ));
            }
        }
    }

    Err(anyhow!("No code received within timeout"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://127.0.0.1:8080";

    #[test]
    fn accepts_code_with_matching_state() {
        assert_eq!(
            parse_callback(BASE, "/callback?code=4%2Fabc&state=xyz", "xyz"),
            Callback::Code("4/abc".into())
        );
    }

    #[test]
    fn rejects_code_with_wrong_state() {
        assert_eq!(
            parse_callback(BASE, "/callback?code=abc&state=evil", "xyz"),
            Callback::Ignored
        );
        assert_eq!(parse_callback(BASE, "/callback?code=abc", "xyz"), Callback::Ignored);
    }

    #[test]
    fn reports_denial() {
        assert_eq!(
            parse_callback(BASE, "/callback?error=access_denied&state=xyz", "xyz"),
            Callback::Denied("access_denied".into())
        );
    }

    #[test]
    fn ignores_unrelated_requests() {
        assert_eq!(parse_callback(BASE, "/favicon.ico", "xyz"), Callback::Ignored);
    }
}
