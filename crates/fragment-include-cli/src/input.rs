//! Where the document to expand comes from.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fragment_include::{FragmentSource, HttpFragmentSource, IncludeConfig};
use tokio::io::AsyncReadExt;
use url::Url;

/// Source of the HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
    Url(Url),
}

impl Input {
    /// Interpret a CLI argument. `None` and `-` mean stdin; anything that
    /// parses as an `http(s)` URL is fetched; everything else is a path.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("-") => Input::Stdin,
            Some(raw) => match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Input::Url(url),
                _ => Input::File(PathBuf::from(raw)),
            },
        }
    }

    /// Base URL implied by the input itself.
    pub fn base_url(&self) -> Option<Url> {
        match self {
            Input::Url(url) => Some(url.clone()),
            _ => None,
        }
    }

    /// Read the whole document.
    ///
    /// URL inputs go through the same HTTP client settings (timeout, user
    /// agent) as the fragments.
    pub async fn read(&self, config: &IncludeConfig) -> Result<String> {
        match self {
            Input::Stdin => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read document from stdin")?;
                Ok(buf)
            }
            Input::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            Input::Url(url) => {
                let client = HttpFragmentSource::new(config)?;
                client
                    .fetch(url)
                    .await
                    .with_context(|| format!("Failed to fetch {url}"))
            }
        }
    }
}
