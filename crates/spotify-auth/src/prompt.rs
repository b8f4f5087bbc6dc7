//! Interactive step of the authorization flows
//!
//! The flow shows the authorization URL, the user approves the app in a
//! browser, then hands back the URL they were redirected to. How that
//! exchange happens is pluggable: the default reads a line from stdin.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Shows the authorization URL and returns the redirect URL the user landed on.
///
/// Returns a boxed future so the flows can hold `Box<dyn RedirectPrompt>`.
pub trait RedirectPrompt: Send + Sync {
    fn prompt<'a>(
        &'a self,
        authorize_url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

impl<T: RedirectPrompt + ?Sized> RedirectPrompt for Arc<T> {
    fn prompt<'a>(
        &'a self,
        authorize_url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        (**self).prompt(authorize_url)
    }
}

/// Prints the URL on stderr and reads the redirect URL from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl RedirectPrompt for StdinPrompt {
    fn prompt<'a>(
        &'a self,
        authorize_url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let mut stderr = tokio::io::stderr();
            let banner = format!(
                "\nOpen this URL in your browser and approve access:\n\n  {authorize_url}\n\n\
                 Then paste the URL you were redirected to: "
            );
            stderr
                .write_all(banner.as_bytes())
                .await
                .map_err(|e| Error::Prompt(format!("cannot write prompt: {e}")))?;
            stderr
                .flush()
                .await
                .map_err(|e| Error::Prompt(format!("cannot write prompt: {e}")))?;

            let mut line = String::new();
            let read = BufReader::new(tokio::io::stdin())
                .read_line(&mut line)
                .await
                .map_err(|e| Error::Prompt(format!("cannot read redirect URL: {e}")))?;
            if read == 0 {
                return Err(Error::Prompt("stdin closed before a redirect URL was entered".into()));
            }
            Ok(line.trim().to_owned())
        })
    }
}

/// Run `prompt`, bounded by `timeout` if one is configured.
pub(crate) async fn await_redirect(
    prompt: &dyn RedirectPrompt,
    authorize_url: &Url,
    timeout: Option<Duration>,
) -> Result<String> {
    info!("waiting for user authorization");
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, prompt.prompt(authorize_url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "gave up waiting for redirect URL");
                Err(Error::PromptTimeout(limit))
            }
        },
        None => prompt.prompt(authorize_url).await,
    }
}
