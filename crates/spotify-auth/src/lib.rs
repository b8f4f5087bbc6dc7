//! Spotify Web API authorization library
//!
//! Acquires, caches, validates and refreshes user access tokens for the
//! Spotify Web API using either the confidential-client Authorization Code
//! flow or the public-client Authorization Code with PKCE flow.
//!
//! Token lifecycle on every `AuthFlow::get_token()`:
//! 1. Load the cached record from `TokenStore`
//! 2. `flow::decide` picks cached, refresh, or full authorization
//! 3. Authorization shows the URL through a `RedirectPrompt`, validates the
//!    returned `state`, and exchanges the code at the token endpoint
//! 4. Any new record is persisted before the access token is returned
//!
//! The HTTP client is injected and owned by the flow; nothing here spawns
//! background tasks.

pub mod code;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod pkce_flow;
pub mod prompt;
pub mod redirect;
pub mod scope;
pub mod store;
pub mod token;

pub use code::AuthorizationCodeFlow;
pub use config::{FlowConfig, FlowKind, FlowOptions};
pub use error::{Error, Result};
pub use flow::{AuthFlow, AuthorizeReason, Decision, decide};
pub use pkce::{PkceChallenge, compute_challenge, generate_state, generate_verifier};
pub use pkce_flow::AuthorizationCodeWithPkceFlow;
pub use prompt::{RedirectPrompt, StdinPrompt};
pub use scope::Scope;
pub use store::TokenStore;
pub use token::TokenRecord;
