//! Error types for authorization flows

use std::time::Duration;

/// Errors from token acquisition and flow construction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no {name}: pass it explicitly or set the {env_var} environment variable")]
    MissingCredential {
        name: &'static str,
        env_var: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("state parameter in redirect does not match the authorization request")]
    StateMismatch,

    #[error("authorization denied: {0}")]
    UserDenied(String),

    #[error("invalid redirect URL: {0}")]
    InvalidRedirect(String),

    #[error("token endpoint returned {status} ({error}): {description}")]
    TokenRequest {
        status: u16,
        error: String,
        description: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("redirect prompt failed: {0}")]
    Prompt(String),

    #[error("no redirect URL supplied within {}s", .0.as_secs())]
    PromptTimeout(Duration),
}

impl Error {
    /// Whether this is the token endpoint rejecting a grant with HTTP 400,
    /// the one failure a flow recovers from by re-authorizing.
    pub fn is_rejected_grant(&self) -> bool {
        matches!(self, Error::TokenRequest { status: 400, .. })
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
