//! Backend endpoints.

use tracing::warn;

/// Used when `LAREK_API_ORIGIN` is not set.
pub const DEFAULT_API_ORIGIN: &str = "http://localhost:3000";

/// Where the API adapter sends requests and where product images live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub api_origin: String,
    /// `{origin}/api/weblarek`
    pub api_url: String,
    /// `{origin}/content/weblarek`, prefixed to every product image.
    pub cdn_url: String,
}

impl StorefrontConfig {
    pub fn from_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            api_origin: origin.to_string(),
            api_url: format!("{origin}/api/weblarek"),
            cdn_url: format!("{origin}/content/weblarek"),
        }
    }

    /// Read `LAREK_API_ORIGIN`, `LAREK_API_URL` and `LAREK_CDN_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let origin = lookup("LAREK_API_ORIGIN")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                warn!("LAREK_API_ORIGIN not set; using {DEFAULT_API_ORIGIN}");
                DEFAULT_API_ORIGIN.to_string()
            });

        let mut config = Self::from_origin(&origin);
        if let Some(api_url) = lookup("LAREK_API_URL") {
            config.api_url = api_url;
        }
        if let Some(cdn_url) = lookup("LAREK_CDN_URL") {
            config.cdn_url = cdn_url;
        }
        config
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self::from_origin(DEFAULT_API_ORIGIN)
    }
}
