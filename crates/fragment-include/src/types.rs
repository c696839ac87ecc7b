//! Core data types for placeholders, per-placeholder outcomes, and pass reports.

use ego_tree::NodeId;
use serde::{Serialize, Serializer};

/// A placeholder element discovered at scan time.
///
/// Holds the tree node id of the element, so the placeholder keeps its
/// identity even when earlier substitutions shift its siblings around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Node id of the element inside the owning [`crate::Document`].
    pub node: NodeId,
    /// Raw value of the marker attribute, used verbatim as a locator.
    pub locator: String,
    /// Position within the snapshotted placeholder set (document order).
    pub index: usize,
}

/// Terminal state of one placeholder within one pass.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The placeholder was replaced by `nodes` root-level nodes of the fragment.
    ///
    /// A placeholder nested inside one that was replaced earlier in the same
    /// pass is still substituted, but inside the detached subtree, so its
    /// content does not show up in the document.
    Substituted { nodes: usize },
    /// Retrieval or substitution failed; the placeholder is untouched.
    Failed {
        #[serde(serialize_with = "serialize_display")]
        reason: IncludeError,
    },
}

impl Outcome {
    pub fn is_substituted(&self) -> bool {
        matches!(self, Outcome::Substituted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One line of a [`PassReport`].
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub index: usize,
    pub locator: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Ordered outcomes of a single pass, one entry per snapshotted placeholder.
#[derive(Debug, Default, Serialize)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: usize,
    pub entries: Vec<ReportEntry>,
}

impl PassReport {
    /// Create an empty report for the given pass number.
    pub fn new(pass: usize) -> Self {
        Self {
            pass,
            entries: Vec::new(),
        }
    }

    /// Record the outcome for a placeholder.
    pub fn push(&mut self, placeholder: &Placeholder, outcome: Outcome) {
        self.entries.push(ReportEntry {
            index: placeholder.index,
            locator: placeholder.locator.clone(),
            outcome,
        });
    }

    /// Number of placeholders attempted in this pass.
    pub fn attempted(&self) -> usize {
        self.entries.len()
    }

    pub fn substituted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_substituted())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failed()).count()
    }
}

fn serialize_display<S: Serializer>(err: &IncludeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

/// Errors that can occur while including a single fragment.
///
/// These never escape a pass; they are recorded as [`Outcome::Failed`].
#[derive(thiserror::Error, Debug)]
pub enum IncludeError {
    #[error("Invalid locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fragment unavailable: {0}")]
    Unavailable(String),

    #[error("Placeholder is no longer attached to the document")]
    Detached,
}

/// Convenience result type.
pub type IncludeResult<T> = Result<T, IncludeError>;
