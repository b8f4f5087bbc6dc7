//! Flow configuration
//!
//! `FlowOptions` is the loose, all-optional input a caller fills in.
//! `FlowConfig::from_options` resolves credentials from the environment,
//! validates everything once, and yields an immutable config. There is no way
//! to hold a partially valid `FlowConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use reqwest::Url;
use serde::Deserialize;

use crate::constants::{AUTHORIZE_ENDPOINT, DEFAULT_CACHE_PATH, TOKEN_ENDPOINT};
use crate::credentials::{CredentialKind, resolve_credential};
use crate::error::{Error, Result};
use crate::scope::Scope;

/// The two supported grant flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Confidential client: client secret + HTTP Basic auth.
    #[default]
    AuthorizationCode,
    /// Public client: PKCE instead of a secret.
    #[serde(alias = "pkce")]
    AuthorizationCodeWithPkce,
}

impl FlowKind {
    /// Label for logging.
    pub fn label(self) -> &'static str {
        match self {
            FlowKind::AuthorizationCode => "authorization_code",
            FlowKind::AuthorizationCodeWithPkce => "authorization_code_with_pkce",
        }
    }
}

/// Caller-supplied flow settings. Unset credentials fall back to the
/// `SPOTIFY_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct FlowOptions {
    pub client_id: Option<String>,
    /// Only read by the Authorization Code flow.
    pub client_secret: Option<Secret<String>>,
    pub redirect_uri: Option<String>,
    pub scope: Scope,
    /// Force the consent dialog even if the user already approved the app.
    /// Ignored by the PKCE flow.
    pub show_dialog: bool,
    /// Token cache file, defaults to `.cached_spotify_token`.
    pub cache_path: Option<PathBuf>,
    pub authorize_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    /// Upper bound on waiting for the user to paste the redirect URL.
    pub prompt_timeout: Option<Duration>,
}

/// Validated, immutable flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    client_id: String,
    redirect_uri: String,
    scope: Scope,
    show_dialog: bool,
    cache_path: PathBuf,
    authorize_endpoint: Url,
    token_endpoint: Url,
    prompt_timeout: Option<Duration>,
}

impl FlowConfig {
    /// Resolve and validate the options shared by both flows.
    ///
    /// The client secret is not part of this config; the Authorization Code
    /// flow resolves it separately with [`resolve_client_secret`].
    pub fn from_options(options: &FlowOptions) -> Result<Self> {
        let client_id = resolve_credential(options.client_id.as_deref(), CredentialKind::ClientId)?;
        let redirect_uri =
            resolve_credential(options.redirect_uri.as_deref(), CredentialKind::RedirectUri)?;
        Url::parse(&redirect_uri).map_err(|e| {
            Error::InvalidConfig(format!("redirect_uri {redirect_uri:?} is not a URL: {e}"))
        })?;

        let authorize_endpoint = parse_endpoint(
            "authorize_endpoint",
            options.authorize_endpoint.as_deref().unwrap_or(AUTHORIZE_ENDPOINT),
        )?;
        let token_endpoint = parse_endpoint(
            "token_endpoint",
            options.token_endpoint.as_deref().unwrap_or(TOKEN_ENDPOINT),
        )?;

        if options.prompt_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidConfig(
                "prompt_timeout must be greater than 0".into(),
            ));
        }

        let cache_path = match &options.cache_path {
            Some(p) if p.as_os_str().is_empty() => {
                return Err(Error::InvalidConfig("cache_path must not be empty".into()));
            }
            Some(p) => p.clone(),
            None => PathBuf::from(DEFAULT_CACHE_PATH),
        };

        Ok(Self {
            client_id,
            redirect_uri,
            scope: options.scope.clone(),
            show_dialog: options.show_dialog,
            cache_path,
            authorize_endpoint,
            token_endpoint,
            prompt_timeout: options.prompt_timeout,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn show_dialog(&self) -> bool {
        self.show_dialog
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn authorize_endpoint(&self) -> &Url {
        &self.authorize_endpoint
    }

    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    pub fn prompt_timeout(&self) -> Option<Duration> {
        self.prompt_timeout
    }
}

/// Resolve the client secret for the Authorization Code flow.
pub fn resolve_client_secret(options: &FlowOptions) -> Result<Secret<String>> {
    let explicit = options.client_secret.as_ref().map(|s| s.expose().as_str());
    resolve_credential(explicit, CredentialKind::ClientSecret).map(Secret::new)
}

fn parse_endpoint(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| Error::InvalidConfig(format!("{name} {value:?} is not a URL: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidConfig(format!(
            "{name} must start with http:// or https://, got: {value}"
        )));
    }
    Ok(url)
}
