//! Authorization Code with PKCE flow for public clients
//!
//! No client secret exists. Each authorization attempt generates its own
//! verifier; the challenge travels in the authorization URL and the verifier
//! in the code exchange.

use tracing::debug;

use crate::config::{FlowConfig, FlowKind, FlowOptions};
use crate::error::Result;
use crate::flow::{FlowCore, Grant};
use crate::pkce::{PkceChallenge, generate_state};
use crate::prompt::RedirectPrompt;
use crate::redirect::build_authorize_url;
use crate::token::{TokenRecord, now_secs};

/// Public-client flow. Built through [`AuthFlow::new`](crate::AuthFlow::new).
pub struct AuthorizationCodeWithPkceFlow {
    pub(crate) core: FlowCore,
}

impl AuthorizationCodeWithPkceFlow {
    pub(crate) fn new(
        options: &FlowOptions,
        http: reqwest::Client,
        prompt: Box<dyn RedirectPrompt>,
    ) -> Result<Self> {
        let config = FlowConfig::from_options(options)?;
        if config.show_dialog() {
            debug!("show_dialog is not supported by the PKCE flow, ignoring it");
        }
        Ok(Self {
            core: FlowCore::new(FlowKind::AuthorizationCodeWithPkce, config, http, prompt),
        })
    }
}

impl Grant for AuthorizationCodeWithPkceFlow {
    fn core(&self) -> &FlowCore {
        &self.core
    }

    async fn authorize_and_exchange(&self) -> Result<TokenRecord> {
        let config = &self.core.config;
        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let scope = config.scope().to_string();

        let mut params = vec![
            ("client_id", config.client_id()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri()),
            ("code_challenge_method", "S256"),
            ("code_challenge", pkce.challenge.as_str()),
            ("state", state.as_str()),
        ];
        if !config.scope().is_empty() {
            params.push(("scope", scope.as_str()));
        }
        let authorize_url = build_authorize_url(config.authorize_endpoint(), &params);

        let code = self.core.receive_code(&authorize_url, &state).await?;
        debug!("exchanging authorization code with PKCE verifier");
        let response = self
            .core
            .request(
                None,
                &[
                    ("client_id", config.client_id()),
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("redirect_uri", config.redirect_uri()),
                    ("code_verifier", pkce.verifier.as_str()),
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
                None,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", self.core.config.client_id()),
                ],
                "token refresh",
            )
            .await?;
        Ok(TokenRecord::refreshed(response, prior, now_secs()))
    }
}
