//! One CLI invocation: load, expand, write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fragment_include::{Document, FragmentIncluder, IncludeConfig, PassReport};

use crate::input::Input;

/// Everything a run needs, already resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: Input,
    /// Destination for the expanded HTML. `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// Destination for the JSON pass reports, if wanted.
    pub report: Option<PathBuf>,
    pub passes: usize,
    pub config: IncludeConfig,
}

impl RunOptions {
    /// The includer config with the input URL as a fallback base.
    ///
    /// An explicit base (flag or env var) always wins.
    pub fn effective_config(&self) -> IncludeConfig {
        let mut config = self.config.clone();
        if config.base_url.is_none() {
            config.base_url = self.input.base_url();
        }
        config
    }
}

/// Expand the input document and write the result.
///
/// Failed placeholders do not make the run fail; only unusable input or
/// output does.
pub async fn execute(opts: &RunOptions) -> Result<Vec<PassReport>> {
    let config = opts.effective_config();
    let markup = opts.input.read(&config).await?;
    let mut doc = Document::parse(&markup);

    let includer =
        FragmentIncluder::from_config(config).context("Failed to build HTTP client")?;
    let reports = includer.run_passes(&mut doc, opts.passes.max(1)).await;

    let html = doc.html();
    match &opts.output {
        Some(path) => tokio::fs::write(path, html)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }

    if let Some(path) = &opts.report {
        let json = serde_json::to_string_pretty(&reports)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    for report in &reports {
        tracing::info!(
            "Pass {}: {} placeholders, {} substituted, {} failed",
            report.pass,
            report.attempted(),
            report.substituted(),
            report.failed()
        );
    }

    Ok(reports)
}
