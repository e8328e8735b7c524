/// Configuration management
use serde::Deserialize;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cookie_secure() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// HMAC secret for session tokens. Rotating it invalidates every
    /// outstanding token.
    pub jwt_secret: String,
    /// Base64-encoded 32-byte key encrypting TOTP secrets at rest.
    pub twofa_enc_key: String,
    /// Whether issued cookies carry the `Secure` attribute. Owned by the
    /// deployment, not derived from any test-mode flag.
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
