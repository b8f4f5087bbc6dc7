//! PKCE (Proof Key for Code Exchange) per RFC 7636, plus the CSRF state nonce
//!
//! The verifier stays with the flow and is sent during token exchange; the
//! challenge goes in the authorization URL so the authorization server can
//! check that the exchange comes from the party that started the flow. Both
//! are generated fresh for every authorization attempt and never cached.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::constants::STATE_LEN;

/// RFC 7636 unreserved characters allowed in a code verifier.
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const STATE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Shortest verifier RFC 7636 allows.
pub const MIN_VERIFIER_LEN: usize = 43;

/// Longest verifier RFC 7636 allows.
pub const MAX_VERIFIER_LEN: usize = 128;

/// A verifier and its S256 challenge, bound to one authorization attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a fresh verifier/challenge pair.
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a random code verifier of random length in `[43, 128]`.
pub fn generate_verifier() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN);
    random_string(&mut rng, VERIFIER_CHARSET, len)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL-NOPAD(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate an alphanumeric `state` nonce for one authorization request.
pub fn generate_state() -> String {
    random_string(&mut rand::rng(), STATE_CHARSET, STATE_LEN)
}

fn random_string(rng: &mut impl RngExt, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}
