//! Spotify accounts service constants
//!
//! Endpoints and environment variable names shared by both grant flows. The
//! endpoints can be overridden per flow through `FlowOptions`.

/// Authorization endpoint the user is sent to for login and consent
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";

/// Environment variable holding the client ID
pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";

/// Environment variable holding the client secret (Authorization Code flow only)
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// Environment variable holding the registered redirect URI
pub const REDIRECT_URI_ENV: &str = "SPOTIFY_REDIRECT_URI";

/// Default token cache location, relative to the working directory
pub const DEFAULT_CACHE_PATH: &str = ".cached_spotify_token";

/// A token is treated as expired this many seconds before `expires_at`.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Length of the CSRF `state` nonce sent with each authorization request
pub const STATE_LEN: usize = 16;
