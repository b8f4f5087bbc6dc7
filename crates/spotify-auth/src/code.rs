//! Authorization Code flow for confidential clients
//!
//! The client authenticates to the token endpoint with HTTP Basic auth
//! (`client_id:client_secret`). Only use this where the secret can be kept
//! off end-user machines.

use common::Secret;
use reqwest::header::HeaderValue;
use tracing::debug;

use crate::config::{FlowConfig, FlowKind, FlowOptions, resolve_client_secret};
use crate::error::Result;
use crate::flow::{FlowCore, Grant};
use crate::pkce::generate_state;
use crate::prompt::RedirectPrompt;
use crate::redirect::build_authorize_url;
use crate::token::{TokenRecord, basic_authorization, now_secs};

/// Confidential-client flow. Built through [`AuthFlow::new`](crate::AuthFlow::new).
pub struct AuthorizationCodeFlow {
    pub(crate) core: FlowCore,
    client_secret: Secret<String>,
}

impl AuthorizationCodeFlow {
    pub(crate) fn new(
        options: &FlowOptions,
        http: reqwest::Client,
        prompt: Box<dyn RedirectPrompt>,
    ) -> Result<Self> {
        let config = FlowConfig::from_options(options)?;
        let client_secret = resolve_client_secret(options)?;
        // Rejects credentials that cannot form a header before any network call.
        basic_authorization(config.client_id(), client_secret.expose())?;

        Ok(Self {
            core: FlowCore::new(FlowKind::AuthorizationCode, config, http, prompt),
            client_secret,
        })
    }

    fn authorization(&self) -> Result<HeaderValue> {
        basic_authorization(self.core.config.client_id(), self.client_secret.expose())
    }
}

impl Grant for AuthorizationCodeFlow {
    fn core(&self) -> &FlowCore {
        &self.core
    }

    async fn authorize_and_exchange(&self) -> Result<TokenRecord> {
        let config = &self.core.config;
        let state = generate_state();
        let scope = config.scope().to_string();

        let mut params = vec![
            ("client_id", config.client_id()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri()),
            ("state", state.as_str()),
        ];
        if !config.scope().is_empty() {
            params.push(("scope", scope.as_str()));
        }
        if config.show_dialog() {
            params.push(("show_dialog", "true"));
        }
        let authorize_url = build_authorize_url(config.authorize_endpoint(), &params);

        let code = self.core.receive_code(&authorize_url, &state).await?;
        debug!("exchanging authorization code");
        let response = self
            .core
            .request(
                Some(self.authorization()?),
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("redirect_uri", config.redirect_uri()),
                ],
                "code exchange",
            )
            .await?;
        Ok(TokenRecord::issued(response, config.scope(), now_secs()))
    }

    async fn refresh(&self, refresh_token: &str, prior: &TokenRecord) -> Result<TokenRecord> {
        let response = self
            .core
            .request(
                Some(self.authorization()?),
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("redirect_uri", self.core.config.redirect_uri()),
                ],
                "token refresh",
            )
            .await?;
        Ok(TokenRecord::refreshed(response, prior, now_secs()))
    }
}
