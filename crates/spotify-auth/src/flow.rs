//! Token lifecycle state machine
//!
//! Every `get_token()` call reads the cache and makes one decision:
//!
//! - `UseCached`: scope matches and the token is fresh, no network call
//! - `Refresh`: scope matches but the token expired, refresh it
//! - `Authorize`: no usable cache, run the interactive authorization
//!
//! A refresh the token endpoint rejects with HTTP 400 (revoked or expired
//! refresh token) clears the cache and falls back to authorization exactly
//! once. Every other failure is returned to the caller as is.

use reqwest::Url;
use reqwest::header::HeaderValue;
use tracing::{Instrument, Span, debug, info, warn};

use crate::config::{FlowConfig, FlowKind, FlowOptions};
use crate::error::{Error, Result};
use crate::prompt::{RedirectPrompt, await_redirect};
use crate::redirect::parse_redirect;
use crate::scope::Scope;
use crate::store::TokenStore;
use crate::token::{TokenRecord, TokenResponse, now_secs, request_token};
use crate::{AuthorizationCodeFlow, AuthorizationCodeWithPkceFlow};

/// Why a full authorization is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizeReason {
    NoCachedToken,
    ScopeChanged,
    NoRefreshToken,
    RefreshRejected,
}

impl AuthorizeReason {
    pub fn label(self) -> &'static str {
        match self {
            AuthorizeReason::NoCachedToken => "no_cached_token",
            AuthorizeReason::ScopeChanged => "scope_changed",
            AuthorizeReason::NoRefreshToken => "no_refresh_token",
            AuthorizeReason::RefreshRejected => "refresh_rejected",
        }
    }
}

/// What to do with the cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    UseCached(TokenRecord),
    Refresh {
        prior: TokenRecord,
        refresh_token: String,
    },
    Authorize(AuthorizeReason),
}

/// Decide how to produce a token from the cached record.
///
/// A scope mismatch wins over expiry: a record granted for other permissions
/// is never refreshed.
pub fn decide(cached: Option<TokenRecord>, configured: &Scope, now: i64) -> Decision {
    let Some(record) = cached else {
        return Decision::Authorize(AuthorizeReason::NoCachedToken);
    };
    if record.scope() != *configured {
        return Decision::Authorize(AuthorizeReason::ScopeChanged);
    }
    if !record.is_expired_at(now) {
        return Decision::UseCached(record);
    }
    match record.refresh_token.clone() {
        Some(refresh_token) => Decision::Refresh {
            prior: record,
            refresh_token,
        },
        None => Decision::Authorize(AuthorizeReason::NoRefreshToken),
    }
}

/// State shared by both grant flows.
pub(crate) struct FlowCore {
    pub(crate) kind: FlowKind,
    pub(crate) config: FlowConfig,
    pub(crate) store: TokenStore,
    pub(crate) http: reqwest::Client,
    pub(crate) prompt: Box<dyn RedirectPrompt>,
    pub(crate) span: Span,
    pub(crate) last: Option<TokenRecord>,
}

impl FlowCore {
    pub(crate) fn new(
        kind: FlowKind,
        config: FlowConfig,
        http: reqwest::Client,
        prompt: Box<dyn RedirectPrompt>,
    ) -> Self {
        let span = tracing::info_span!(
            "auth_flow",
            kind = kind.label(),
            client_id = %config.client_id()
        );
        Self {
            kind,
            store: TokenStore::new(config.cache_path()),
            config,
            http,
            prompt,
            span,
            last: None,
        }
    }

    /// Show `authorize_url`, wait for the redirect, and return the code.
    pub(crate) async fn receive_code(&self, authorize_url: &Url, state: &str) -> Result<String> {
        let redirect = await_redirect(
            self.prompt.as_ref(),
            authorize_url,
            self.config.prompt_timeout(),
        )
        .await?;
        parse_redirect(&redirect, state).inspect_err(|e| warn!(error = %e, "redirect rejected"))
    }

    /// POST `form` to the configured token endpoint.
    pub(crate) async fn request(
        &self,
        authorization: Option<HeaderValue>,
        form: &[(&str, &str)],
        operation: &str,
    ) -> Result<TokenResponse> {
        request_token(
            &self.http,
            self.config.token_endpoint(),
            authorization,
            form,
            operation,
        )
        .await
    }
}

/// The two network operations that differ between flows.
pub(crate) trait Grant {
    fn core(&self) -> &FlowCore;

    /// Interactive authorization followed by the code exchange.
    async fn authorize_and_exchange(&self) -> Result<TokenRecord>;

    async fn refresh(&self, refresh_token: &str, prior: &TokenRecord) -> Result<TokenRecord>;
}

/// Produce a usable token record for `grant`, persisting any new one.
pub(crate) async fn obtain<G: Grant>(grant: &G) -> Result<TokenRecord> {
    let core = grant.core();
    let cached = core.store.load().await;

    match decide(cached, core.config.scope(), now_secs()) {
        Decision::UseCached(record) => {
            debug!(expires_at = record.expires_at, "using cached token");
            Ok(record)
        }
        Decision::Refresh {
            prior,
            refresh_token,
        } => {
            info!(expired_at = prior.expires_at, "cached token expired, refreshing");
            match grant.refresh(&refresh_token, &prior).await {
                Ok(record) => {
                    core.store.save(&record).await;
                    info!(expires_at = record.expires_at, "token refreshed");
                    Ok(record)
                }
                Err(e) if e.is_rejected_grant() => {
                    warn!(error = %e, "refresh token rejected, clearing cache and re-authorizing");
                    core.store.clear().await;
                    authorize(grant, AuthorizeReason::RefreshRejected).await
                }
                Err(e) => Err(e),
            }
        }
        Decision::Authorize(reason) => authorize(grant, reason).await,
    }
}

async fn authorize<G: Grant>(grant: &G, reason: AuthorizeReason) -> Result<TokenRecord> {
    info!(reason = reason.label(), "starting authorization");
    let record = grant.authorize_and_exchange().await?;
    grant.core().store.save(&record).await;
    info!(expires_at = record.expires_at, "authorization complete");
    Ok(record)
}

/// A configured grant flow.
///
/// One instance serves one user and one cache file. `get_token` takes
/// `&mut self`; share an instance across tasks behind a `tokio::sync::Mutex`.
pub enum AuthFlow {
    AuthorizationCode(AuthorizationCodeFlow),
    AuthorizationCodeWithPkce(AuthorizationCodeWithPkceFlow),
}

impl AuthFlow {
    /// Build a flow of `kind`. Credentials missing from `options` are read
    /// from the environment; construction fails if any is absent.
    pub fn new(
        kind: FlowKind,
        options: &FlowOptions,
        http: reqwest::Client,
        prompt: impl RedirectPrompt + 'static,
    ) -> Result<Self> {
        let prompt: Box<dyn RedirectPrompt> = Box::new(prompt);
        Ok(match kind {
            FlowKind::AuthorizationCode => {
                AuthFlow::AuthorizationCode(AuthorizationCodeFlow::new(options, http, prompt)?)
            }
            FlowKind::AuthorizationCodeWithPkce => AuthFlow::AuthorizationCodeWithPkce(
                AuthorizationCodeWithPkceFlow::new(options, http, prompt)?,
            ),
        })
    }

    pub fn kind(&self) -> FlowKind {
        self.core().kind
    }

    pub fn config(&self) -> &FlowConfig {
        &self.core().config
    }

    /// Return a usable access token, refreshing or authorizing as needed.
    pub async fn get_token(&mut self) -> Result<String> {
        let span = self.core().span.clone();
        let record = match self {
            AuthFlow::AuthorizationCode(flow) => obtain(&*flow).instrument(span).await?,
            AuthFlow::AuthorizationCodeWithPkce(flow) => obtain(&*flow).instrument(span).await?,
        };
        let access_token = record.access_token.clone();
        self.core_mut().last = Some(record);
        Ok(access_token)
    }

    /// `Authorization` header value for the resource API.
    pub async fn bearer_header(&mut self) -> Result<HeaderValue> {
        let token = self.get_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::InvalidResponse(format!("access token is not a valid header: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// The record behind the last token `get_token` returned.
    pub fn token(&self) -> Option<&TokenRecord> {
        self.core().last.as_ref()
    }

    /// Delete the cache file so the next call authorizes from scratch.
    pub async fn clear_cache(&mut self) {
        let span = self.core().span.clone();
        self.core().store.clear().instrument(span).await;
        self.core_mut().last = None;
    }

    /// Tear down the flow and its HTTP client.
    pub fn close(self) {
        let _guard = self.core().span.enter();
        debug!("closing auth flow");
    }

    fn core(&self) -> &FlowCore {
        match self {
            AuthFlow::AuthorizationCode(flow) => flow.core(),
            AuthFlow::AuthorizationCodeWithPkce(flow) => flow.core(),
        }
    }

    fn core_mut(&mut self) -> &mut FlowCore {
        match self {
            AuthFlow::AuthorizationCode(flow) => &mut flow.core,
            AuthFlow::AuthorizationCodeWithPkce(flow) => &mut flow.core,
        }
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("kind", &self.kind())
            .field("config", self.config())
            .field("token", &self.token())
            .finish_non_exhaustive()
    }
}
