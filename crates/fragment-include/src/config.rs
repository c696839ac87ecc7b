//! Includer configuration and environment resolution.

use std::time::Duration;

use url::Url;

use crate::types::{IncludeError, IncludeResult};

/// Marker attribute used when nothing else is configured.
pub const DEFAULT_ATTRIBUTE: &str = "data-include";

/// Environment variable overriding the marker attribute.
pub const ATTRIBUTE_ENV: &str = "FRAGMENT_INCLUDE_ATTRIBUTE";

/// Environment variable providing the base URL for relative locators.
pub const BASE_URL_ENV: &str = "FRAGMENT_INCLUDE_BASE_URL";

const DEFAULT_USER_AGENT: &str = concat!("fragment-include/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`crate::FragmentIncluder`].
#[derive(Debug, Clone)]
pub struct IncludeConfig {
    /// Attribute marking placeholder elements. Always lowercase, since the
    /// HTML parser lowercases attribute names.
    pub attribute: String,
    /// Base for relative locators when the document has no `<base href>`.
    pub base_url: Option<Url>,
    /// Per-request timeout. `None` leaves it to the network stack.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            base_url: None,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl IncludeConfig {
    /// Build a config from `FRAGMENT_INCLUDE_*` environment variables.
    pub fn from_env() -> IncludeResult<Self> {
        Ok(Self::default()
            .with_attribute(resolve_attribute(None))
            .with_base_url(resolve_base_url(None)?))
    }

    pub fn with_attribute(mut self, attribute: impl AsRef<str>) -> Self {
        self.attribute = attribute.as_ref().trim().to_ascii_lowercase();
        self
    }

    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Resolve the marker attribute: explicit value, then env var, then default.
pub fn resolve_attribute(explicit: Option<&str>) -> String {
    if let Some(attribute) = explicit.filter(|a| !a.trim().is_empty()) {
        return attribute.to_string();
    }

    match std::env::var(ATTRIBUTE_ENV) {
        Ok(attribute) if !attribute.trim().is_empty() => attribute,
        _ => DEFAULT_ATTRIBUTE.to_string(),
    }
}

/// Resolve the base URL: explicit value, then env var. Absent is not an error.
pub fn resolve_base_url(explicit: Option<&str>) -> IncludeResult<Option<Url>> {
    let raw = match explicit {
        Some(raw) => raw.to_string(),
        None => match std::env::var(BASE_URL_ENV) {
            Ok(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        },
    };

    Url::parse(raw.trim())
        .map(Some)
        .map_err(|e| IncludeError::InvalidLocator {
            locator: raw,
            reason: format!("invalid base URL: {e}"),
        })
}
