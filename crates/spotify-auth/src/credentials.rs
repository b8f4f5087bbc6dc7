//! Client credential resolution
//!
//! Every credential comes from an explicit value first, then from its
//! environment variable. Blank values count as absent. Resolution fails fast
//! so a flow is never constructed with a missing credential.

use crate::constants::{CLIENT_ID_ENV, CLIENT_SECRET_ENV, REDIRECT_URI_ENV};
use crate::error::{Error, Result};

/// The credentials a flow may need, with their environment fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ClientId,
    ClientSecret,
    RedirectUri,
}

impl CredentialKind {
    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            CredentialKind::ClientId => "client_id",
            CredentialKind::ClientSecret => "client_secret",
            CredentialKind::RedirectUri => "redirect_uri",
        }
    }

    /// Environment variable consulted when no explicit value is given.
    pub fn env_var(self) -> &'static str {
        match self {
            CredentialKind::ClientId => CLIENT_ID_ENV,
            CredentialKind::ClientSecret => CLIENT_SECRET_ENV,
            CredentialKind::RedirectUri => REDIRECT_URI_ENV,
        }
    }
}

/// Resolve a credential from `explicit` or the kind's environment variable.
///
/// Surrounding whitespace is trimmed from either source.
pub fn resolve_credential(explicit: Option<&str>, kind: CredentialKind) -> Result<String> {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .or_else(|| common::non_empty_var(kind.env_var()))
        .ok_or(Error::MissingCredential {
            name: kind.name(),
            env_var: kind.env_var(),
        })
}
