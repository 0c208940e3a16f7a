use serde::{Deserialize, Serialize};
use std::env;

/// Default base URL of the generative-language API
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model identifier used whenever resolution against the listing
/// endpoint fails
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Configuration struct for the Gemini API.
///
/// Deserialized as the `[gemini]` table of the server's config file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub fallback_model: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
        }
    }
}

impl GeminiConfig {
    /// Fills unset fields from the process environment (`GEMINI_API_KEY`)
    pub fn fill_from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        self
    }

    /// Base URL with the default applied
    pub fn base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Fallback model with the default applied
    pub fn fallback_model(&self) -> &str {
        self.fallback_model
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_apply_defaults_over_unset_fields() {
        let config = GeminiConfig {
            api_key: None,
            api_base_url: None,
            fallback_model: None,
        };
        assert_eq!(config.base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.fallback_model(), DEFAULT_FALLBACK_MODEL);

        let config = GeminiConfig {
            api_key: Some("secret".to_string()),
            api_base_url: Some("http://127.0.0.1:8080".to_string()),
            fallback_model: Some("gemini-2.0-flash".to_string()),
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
        assert_eq!(config.fallback_model(), "gemini-2.0-flash");
    }
}
