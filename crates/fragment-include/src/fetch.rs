//! Fragment retrieval.
//!
//! [`FragmentSource`] is the seam between the includer and the network.
//! [`HttpFragmentSource`] is the production implementation: a bare GET per
//! locator with every HTTP cache bypassed and no retries.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use url::Url;

use crate::config::IncludeConfig;
use crate::types::{IncludeError, IncludeResult};

/// Something that can turn a resolved locator into fragment markup.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Retrieve the full body of the fragment at `url`.
    async fn fetch(&self, url: &Url) -> IncludeResult<String>;
}

/// HTTP fragment source backed by `reqwest`.
#[derive(Clone)]
pub struct HttpFragmentSource {
    client: reqwest::Client,
}

impl HttpFragmentSource {
    /// Build a client from the given configuration.
    ///
    /// No timeout is set unless one is configured.
    pub fn new(config: &IncludeConfig) -> IncludeResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(IncludeError::Client)?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, url: &Url) -> IncludeResult<String> {
        // reqwest keeps no response cache; these headers keep proxies out too.
        let resp = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|source| IncludeError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IncludeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| IncludeError::Body {
            url: url.to_string(),
            source,
        })
    }
}

/// Resolve a placeholder locator against the document base.
///
/// Absolute URLs are used as-is. Anything else is joined onto `base`; with no
/// base a relative locator cannot be fetched.
pub fn resolve_locator(base: Option<&Url>, locator: &str) -> IncludeResult<Url> {
    let invalid = |reason: String| IncludeError::InvalidLocator {
        locator: locator.to_string(),
        reason,
    };

    if locator.trim().is_empty() {
        return Err(invalid("empty locator".to_string()));
    }

    match Url::parse(locator) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(locator).map_err(|e| invalid(e.to_string())),
            None => Err(invalid("relative locator with no base URL".to_string())),
        },
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Work out the base URL for a document.
///
/// A `<base href>` wins; a relative one is resolved against `configured`.
/// Falls back to `configured` when the document has no usable base element.
pub fn document_base(base_href: Option<&str>, configured: Option<&Url>) -> Option<Url> {
    let from_href = base_href.and_then(|href| match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => configured.and_then(|c| c.join(href).ok()),
        Err(_) => None,
    });
    from_href.or_else(|| configured.cloned())
}
