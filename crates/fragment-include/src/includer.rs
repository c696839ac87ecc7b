//! The fragment includer: one pass of discovery, retrieval, and substitution.
//!
//! A pass snapshots the placeholder set up front, then walks it strictly in
//! document order. Each retrieval is awaited and its result applied to the
//! tree before the next one starts. Failures are recorded in the
//! [`PassReport`] and otherwise swallowed, leaving the placeholder untouched.

use url::Url;

use crate::config::IncludeConfig;
use crate::document::Document;
use crate::fetch::{document_base, resolve_locator, FragmentSource, HttpFragmentSource};
use crate::types::{IncludeResult, Outcome, PassReport, Placeholder};

/// Replaces placeholder elements with fragments from a [`FragmentSource`].
pub struct FragmentIncluder<S = HttpFragmentSource> {
    source: S,
    config: IncludeConfig,
}

impl FragmentIncluder<HttpFragmentSource> {
    /// Create an includer that fetches over HTTP.
    pub fn from_config(config: IncludeConfig) -> IncludeResult<Self> {
        let source = HttpFragmentSource::new(&config)?;
        Ok(Self { source, config })
    }
}

impl<S: FragmentSource> FragmentIncluder<S> {
    /// Create an includer with a custom source.
    pub fn new(source: S, config: IncludeConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &IncludeConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one pass over `doc`.
    ///
    /// Every placeholder present when the pass starts is attempted exactly
    /// once. Placeholders that arrive inside substituted fragments are left
    /// for a later pass. This never fails; per-placeholder failures are in
    /// the returned report.
    pub async fn run(&self, doc: &mut Document) -> PassReport {
        self.run_pass(doc, 1).await
    }

    /// Run up to `max_passes` passes, stopping after a pass that finds no
    /// placeholders. Returns one report per pass actually run.
    pub async fn run_passes(&self, doc: &mut Document, max_passes: usize) -> Vec<PassReport> {
        let mut reports = Vec::new();
        for pass in 1..=max_passes {
            let report = self.run_pass(doc, pass).await;
            let empty = report.attempted() == 0;
            reports.push(report);
            if empty {
                break;
            }
        }
        reports
    }

    async fn run_pass(&self, doc: &mut Document, pass: usize) -> PassReport {
        let placeholders = doc.placeholders(&self.config.attribute);
        let base = document_base(doc.base_href(), self.config.base_url.as_ref());
        tracing::debug!(pass, count = placeholders.len(), "include pass started");

        let mut report = PassReport::new(pass);
        for placeholder in &placeholders {
            let outcome = match self.include_one(doc, placeholder, base.as_ref()).await {
                Ok(nodes) => Outcome::Substituted { nodes },
                Err(reason) => {
                    tracing::debug!(
                        locator = %placeholder.locator,
                        error = %reason,
                        "placeholder left unchanged"
                    );
                    Outcome::Failed { reason }
                }
            };
            report.push(placeholder, outcome);
        }

        tracing::debug!(
            pass,
            substituted = report.substituted(),
            failed = report.failed(),
            "include pass finished"
        );
        report
    }

    async fn include_one(
        &self,
        doc: &mut Document,
        placeholder: &Placeholder,
        base: Option<&Url>,
    ) -> IncludeResult<usize> {
        let url = resolve_locator(base, &placeholder.locator)?;
        let body = self.source.fetch(&url).await?;
        doc.substitute(placeholder, &body)
    }
}

/// Run a single silent pass over `doc` with an HTTP source built from `config`.
///
/// This is the default caller: outcomes are discarded. Use
/// [`FragmentIncluder::run`] to inspect them.
pub async fn include(doc: &mut Document, config: IncludeConfig) -> IncludeResult<()> {
    let includer = FragmentIncluder::from_config(config)?;
    includer.run(doc).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::types::IncludeError;

    /// In-memory source that records every fetch and can delay responses.
    #[derive(Default)]
    struct MapSource {
        bodies: HashMap<String, String>,
        delays: HashMap<String, u64>,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl MapSource {
        fn with(mut self, path: &str, body: &str) -> Self {
            self.bodies.insert(path.to_string(), body.to_string());
            self
        }

        fn delayed(mut self, path: &str, ms: u64) -> Self {
            self.delays.insert(path.to_string(), ms);
            self
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FragmentSource for MapSource {
        async fn fetch(&self, url: &Url) -> IncludeResult<String> {
            let path = url.path().to_string();
            self.events.lock().unwrap().push(format!("start {path}"));
            if let Some(ms) = self.delays.get(&path) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            self.events.lock().unwrap().push(format!("end {path}"));
            self.bodies
                .get(&path)
                .cloned()
                .ok_or_else(|| IncludeError::Unavailable(path))
        }
    }

    fn config() -> IncludeConfig {
        IncludeConfig::default().with_base_url(Url::parse("http://site.test/").ok())
    }

    fn body(doc: &Document) -> String {
        let html = doc.html();
        let start = html.find("<body>").map(|i| i + "<body>".len()).unwrap();
        let end = html.find("</body>").unwrap();
        html[start..end].to_string()
    }

    #[tokio::test]
    async fn test_header_is_substituted() {
        let source = MapSource::default().with("/parts/header.html", "<header>Hi</header>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(
            r#"<html><body><div data-include="/parts/header.html"></div><p>x</p></body></html>"#,
        );

        let report = includer.run(&mut doc).await;

        assert_eq!(body(&doc), "<header>Hi</header><p>x</p>");
        assert_eq!(report.attempted(), 1);
        assert_eq!(report.substituted(), 1);
    }

    #[tokio::test]
    async fn test_retrievals_do_not_overlap() {
        // The slow first fragment would finish last if fetches ran concurrently.
        let source = MapSource::default()
            .with("/slow.html", "<p>slow</p>")
            .with("/fast.html", "<p>fast</p>")
            .delayed("/slow.html", 50);
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(
            r#"<body><div data-include="/slow.html"></div><div data-include="/fast.html"></div></body>"#,
        );

        includer.run(&mut doc).await;

        assert_eq!(
            includer.source().events(),
            ["start /slow.html", "end /slow.html", "start /fast.html", "end /fast.html"]
        );
        assert_eq!(body(&doc), "<p>slow</p><p>fast</p>");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_placeholders() {
        let source = MapSource::default()
            .with("/a.html", "<p>A</p>")
            .with("/c.html", "<p>C</p>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(
            r#"<body><i data-include="/a.html"></i><i data-include="/missing.html"></i><i data-include="/c.html"></i></body>"#,
        );

        let report = includer.run(&mut doc).await;

        assert_eq!(
            body(&doc),
            r#"<p>A</p><i data-include="/missing.html"></i><p>C</p>"#
        );
        assert_eq!(report.failed(), 1);
        assert!(report.entries[1].outcome.is_failed());
        assert_eq!(report.entries[1].locator, "/missing.html");
    }

    #[tokio::test]
    async fn test_invalid_locator_is_not_fetched() {
        let source = MapSource::default().with("/a.html", "<p>A</p>");
        let includer = FragmentIncluder::new(source, IncludeConfig::default());
        let mut doc = Document::parse(
            r#"<body><i data-include=""></i><i data-include="/a.html"></i></body>"#,
        );

        let report = includer.run(&mut doc).await;

        // No base URL configured: both are rejected before any fetch.
        assert!(includer.source().events().is_empty());
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            report.entries[0].outcome,
            Outcome::Failed {
                reason: IncludeError::InvalidLocator { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_nested_placeholder_needs_second_pass() {
        let source = MapSource::default()
            .with("/outer.html", r#"<main><div data-include="/inner.html"></div></main>"#)
            .with("/inner.html", "<span>inner</span>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(r#"<body><div data-include="/outer.html"></div></body>"#);

        let first = includer.run(&mut doc).await;
        assert_eq!(first.attempted(), 1);
        assert_eq!(
            body(&doc),
            r#"<main><div data-include="/inner.html"></div></main>"#
        );

        let second = includer.run(&mut doc).await;
        assert_eq!(second.attempted(), 1);
        assert_eq!(body(&doc), "<main><span>inner</span></main>");
    }

    #[tokio::test]
    async fn test_run_passes_stops_when_nothing_left() {
        let source = MapSource::default()
            .with("/outer.html", r#"<div data-include="/inner.html"></div>"#)
            .with("/inner.html", "<b>done</b>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(r#"<body><div data-include="/outer.html"></div></body>"#);

        let reports = includer.run_passes(&mut doc, 5).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[2].attempted(), 0);
        assert_eq!(reports.iter().map(|r| r.pass).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(body(&doc), "<b>done</b>");
    }

    #[tokio::test]
    async fn test_run_passes_respects_limit() {
        let source = MapSource::default().with("/loop.html", r#"<i data-include="/loop.html"></i>"#);
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(r#"<body><i data-include="/loop.html"></i></body>"#);

        let reports = includer.run_passes(&mut doc, 3).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(includer.source().events().len(), 6);
    }

    #[tokio::test]
    async fn test_placeholder_inside_placeholder() {
        let source = MapSource::default()
            .with("/outer.html", "<p>outer</p>")
            .with("/inner.html", "<p>inner</p>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(
            r#"<body><div data-include="/outer.html"><div data-include="/inner.html"></div></div></body>"#,
        );

        let report = includer.run(&mut doc).await;

        // The inner one is still attempted, but it now lives in a detached subtree.
        assert_eq!(report.attempted(), 2);
        assert_eq!(includer.source().events().len(), 4);
        assert_eq!(body(&doc), "<p>outer</p>");
    }

    #[tokio::test]
    async fn test_base_href_is_used() {
        let source = MapSource::default().with("/v2/nav.html", "<nav>v2</nav>");
        let includer = FragmentIncluder::new(source, config());
        let mut doc = Document::parse(
            r#"<html><head><base href="/v2/"></head><body><div data-include="nav.html"></div></body></html>"#,
        );

        let report = includer.run(&mut doc).await;

        assert_eq!(report.substituted(), 1);
        assert_eq!(body(&doc), "<nav>v2</nav>");
    }
}
