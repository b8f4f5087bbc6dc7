//! Configuration types and loading
//!
//! Config precedence: `--config` > `SPOTIFY_TOKEN_CONFIG` > `spotify-token.toml`.
//! A missing default file means built-in defaults. The client secret is read
//! from `SPOTIFY_CLIENT_SECRET` or `client_secret_file`, never from the TOML
//! body itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use spotify_auth::constants::CLIENT_SECRET_ENV;
use spotify_auth::{FlowKind, FlowOptions, Scope};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SPOTIFY_TOKEN_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "spotify-token.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub token: TokenConfig,
    pub http: HttpConfig,
}

/// Application registration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub flow: FlowKind,
    /// Falls back to SPOTIFY_CLIENT_ID
    pub client_id: Option<String>,
    /// Falls back to SPOTIFY_REDIRECT_URI
    pub redirect_uri: Option<String>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// File holding the client secret, used when SPOTIFY_CLIENT_SECRET is unset
    pub client_secret_file: Option<PathBuf>,
    pub show_dialog: bool,
}

/// What to request and where to cache it
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub scope: Scope,
    pub cache_path: Option<PathBuf>,
}

/// Transport settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub prompt_timeout_secs: u64,
    pub authorize_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            prompt_timeout_secs: 300,
            authorize_endpoint: None,
            token_endpoint: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then resolve the client secret.
    ///
    /// Client secret resolution order:
    /// 1. SPOTIFY_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.finish()
    }

    /// Like [`Config::load`], but a missing file at the default location
    /// yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Config::default().finish();
        }
        Self::load(path)
    }

    fn finish(mut self) -> common::Result<Self> {
        if self.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.http.prompt_timeout_secs == 0 {
            return Err(common::Error::Config(
                "prompt_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(secret) = common::non_empty_var(CLIENT_SECRET_ENV) {
            self.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = self.client.client_secret_file {
            self.client.client_secret = common::read_secret_file(secret_file)?;
        }

        Ok(self)
    }

    /// Resolve config file path from CLI arg or SPOTIFY_TOKEN_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Some(p) = common::non_empty_var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Options for `AuthFlow::new`. Unset credentials are left for the
    /// library to resolve from the environment.
    pub fn flow_options(&self) -> FlowOptions {
        FlowOptions {
            client_id: self.client.client_id.clone(),
            client_secret: self.client.client_secret.clone(),
            redirect_uri: self.client.redirect_uri.clone(),
            scope: self.token.scope.clone(),
            show_dialog: self.client.show_dialog,
            cache_path: self.token.cache_path.clone(),
            authorize_endpoint: self.http.authorize_endpoint.clone(),
            token_endpoint: self.http.token_endpoint.clone(),
            prompt_timeout: Some(Duration::from_secs(self.http.prompt_timeout_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[client]
flow = "pkce"
client_id = "abc"
redirect_uri = "http://localhost:8888/callback"
show_dialog = true

[token]
scope = ["user-read-private", "user-read-email", "user-read-private"]
cache_path = "/tmp/spotify-cache.json"

[http]
timeout_secs = 10
prompt_timeout_secs = 60
token_endpoint = "http://127.0.0.1:9999/api/token"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.client.flow, FlowKind::AuthorizationCodeWithPkce);
        assert_eq!(config.client.client_id.as_deref(), Some("abc"));
        assert!(config.client.show_dialog);
        assert!(config.client.client_secret.is_none());
        assert_eq!(config.token.scope.len(), 2);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));

        let options = config.flow_options();
        assert_eq!(options.scope, Scope::from("user-read-email user-read-private"));
        assert_eq!(options.prompt_timeout, Some(Duration::from_secs(60)));
        assert_eq!(
            options.cache_path.as_deref(),
            Some(Path::new("/tmp/spotify-cache.json"))
        );
        assert_eq!(
            options.token_endpoint.as_deref(),
            Some("http://127.0.0.1:9999/api/token")
        );
        assert!(options.authorize_endpoint.is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.client.flow, FlowKind::AuthorizationCode);
        assert!(config.token.scope.is_empty());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.prompt_timeout_secs, 300);
    }

    #[test]
    fn test_scope_as_string() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[token]\nscope = \"b  a\"\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.token.scope, Scope::from(["a", "b"]));
    }

    #[test]
    fn test_malformed_scope_is_empty() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[token]\nscope = { a = 1 }\n");

        let config = Config::load(&path).unwrap();
        assert!(config.token.scope.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_only_tolerates_default_path() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let result = Config::load_or_default(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err(), "an explicit missing path must be an error");
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_unknown_flow_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[client]\nflow = \"implicit_grant\"\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[http]\ntimeout_secs = 0\n");

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("timeout_secs must be greater than 0"), "got: {err}");
    }

    #[test]
    fn test_zero_prompt_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[http]\nprompt_timeout_secs = 0\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_client_secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "file-secret\n").unwrap();
        let path = write_config(
            dir.path(),
            &format!("[client]\nclient_secret_file = {:?}\n", secret_path.display().to_string()),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.client.client_secret.as_ref().unwrap().expose(),
            "file-secret"
        );
    }

    #[test]
    fn test_client_secret_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[client]\nclient_secret_file = \"/nonexistent/client_secret\"\n",
        );

        unsafe { set_env(CLIENT_SECRET_ENV, "env-secret") };
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.client.client_secret.as_ref().unwrap().expose(),
            "env-secret",
            "SPOTIFY_CLIENT_SECRET must take precedence over client_secret_file"
        );
        unsafe { remove_env(CLIENT_SECRET_ENV) };
    }

    #[test]
    fn test_client_secret_file_missing_is_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[client]\nclient_secret_file = \"/nonexistent/client_secret\"\n",
        );

        assert!(matches!(
            Config::load(&path),
            Err(common::Error::SecretFile { .. })
        ));
    }

    #[test]
    fn test_client_secret_file_blank_yields_none() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "  \n  ").unwrap();
        let path = write_config(
            dir.path(),
            &format!("[client]\nclient_secret_file = {:?}\n", secret_path.display().to_string()),
        );

        let config = Config::load(&path).unwrap();
        assert!(config.client.client_secret.is_none());
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(CONFIG_PATH_ENV, "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env(CONFIG_PATH_ENV) };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(CONFIG_PATH_ENV) };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(CONFIG_PATH_ENV, "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over SPOTIFY_TOKEN_CONFIG"
        );
        unsafe { remove_env(CONFIG_PATH_ENV) };
    }
}
