use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::gemini::client;
use crate::insights::client::DEFAULT_SERP_API_URL;
use crate::keys::{KeyPool, DEFAULT_COOLDOWN, DEFAULT_MAX_WAIT};

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Credential pool for the generation API (GEMINI_API_KEYS,
    /// comma-separated).
    pub gemini_api_keys: Vec<String>,
    /// Generation API base URL (override for testing against a stub).
    pub gemini_api_url: String,
    pub gemini_text_model: String,
    pub gemini_image_model: String,
    /// SerpAPI key — optional; threads degrade to empty insights without it.
    pub serp_api_key: String,
    pub serp_api_url: String,
    /// How long an overloaded key sits out of rotation.
    pub key_cooldown: Duration,
    /// Upper bound on waiting for a key when the whole pool is cooling.
    pub max_key_wait: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the key pool — commands that call
    /// the generation API must gate on [`Config::require_gemini`] first.
    pub fn load() -> Result<Self> {
        let gemini_api_keys: Vec<String> = env::var("GEMINI_API_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            gemini_api_keys,
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| client::DEFAULT_API_URL.to_string()),
            gemini_text_model: env::var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|_| client::DEFAULT_TEXT_MODEL.to_string()),
            gemini_image_model: env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| client::DEFAULT_IMAGE_MODEL.to_string()),
            serp_api_key: env::var("SERP_API_KEY").unwrap_or_default(),
            serp_api_url: env::var("SERP_API_URL")
                .unwrap_or_else(|_| DEFAULT_SERP_API_URL.to_string()),
            key_cooldown: duration_from_env("EMBER_KEY_COOLDOWN_SECS", DEFAULT_COOLDOWN),
            max_key_wait: duration_from_env("EMBER_MAX_KEY_WAIT_SECS", DEFAULT_MAX_WAIT),
        })
    }

    /// Check that at least one generation credential is configured.
    /// Call this before any operation that hits the generation API.
    pub fn require_gemini(&self) -> Result<()> {
        if self.gemini_api_keys.is_empty() {
            anyhow::bail!(
                "GEMINI_API_KEYS not set. Add a comma-separated key list to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that the SerpAPI key is configured.
    /// Call this before any operation that needs topic insights.
    pub fn require_serp(&self) -> Result<()> {
        if self.serp_api_key.is_empty() {
            anyhow::bail!(
                "SERP_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Build the key pool this configuration describes.
    pub fn key_pool(&self) -> KeyPool {
        KeyPool::new(
            self.gemini_api_keys.iter().cloned(),
            self.key_cooldown,
            self.max_key_wait,
        )
    }
}

/// Parse a whole-seconds duration from an env var, with a default.
fn duration_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
