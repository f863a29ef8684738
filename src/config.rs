//! Environment-driven runtime configuration

#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the sled database directory.
    pub db_path: String,
    /// Company partition used for exit permits created from chat.
    pub default_company: String,
    /// Base URL of the OpenAI-compatible fallback endpoint. Unset means
    /// the AI fallback is disabled entirely.
    pub fallback_api_base: Option<String>,
    pub fallback_api_key: String,
    pub fallback_model: String,
    /// Hard bound on one fallback call, in milliseconds.
    pub fallback_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "approval.db".to_string(),
            default_company: "main".to_string(),
            fallback_api_base: None,
            fallback_api_key: String::new(),
            fallback_model: "gpt-4o-mini".to_string(),
            fallback_timeout_ms: 5_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            db_path: std::env::var("APPROVAL_DB_PATH").unwrap_or(default.db_path),
            default_company: std::env::var("APPROVAL_DEFAULT_COMPANY")
                .unwrap_or(default.default_company),
            fallback_api_base: std::env::var("FALLBACK_API_BASE").ok(),
            fallback_api_key: std::env::var("FALLBACK_API_KEY").unwrap_or(default.fallback_api_key),
            fallback_model: std::env::var("FALLBACK_MODEL").unwrap_or(default.fallback_model),
            fallback_timeout_ms: std::env::var("FALLBACK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.fallback_timeout_ms),
        }
    }
}
