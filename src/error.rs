use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Request URL rejected before any network activity
    Validate,
    /// Plain HTTP fetch failed
    Fetch,
    /// Browser session or navigation failed
    Render,
    /// A single automation action failed
    Interact,
    /// Parsing or extraction of a candidate failed
    Parse,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::Fetch => "fetch",
            Phase::Render => "render",
            Phase::Interact => "interact",
            Phase::Parse => "parse",
        };
        f.write_str(name)
    }
}

/// One recorded failure, as reported in the result's `errors` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
    pub phase: Phase,
}

impl ErrorEntry {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
        }
    }
}

/// Append-only log of recoverable failures, in order of occurrence.
///
/// Every stage after validation receives the log by `&mut` and pushes to it
/// instead of returning an error past its own boundary.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for the given phase
    pub fn push(&mut self, phase: Phase, message: impl Into<String>) {
        let entry = ErrorEntry::new(phase, message);
        ::log::warn!("[{}] {}", entry.phase, entry.message);
        self.entries.push(entry);
    }

    /// Move all entries of another log to the end of this one
    pub fn append(&mut self, other: ErrorLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries recorded for one phase
    pub fn count(&self, phase: Phase) -> usize {
        self.entries.iter().filter(|e| e.phase == phase).count()
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.entries
    }
}

/// The only failure `scrape` surfaces to its caller
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme {scheme:?}: only http and https are allowed")]
    UnsupportedScheme { scheme: String },
}

impl ScrapeError {
    pub fn phase(&self) -> Phase {
        Phase::Validate
    }

    /// The error as a result-style entry, for the external layer to report
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry::new(self.phase(), self.to_string())
    }
}

/// Static HTTP fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {status}")]
    Status { status: u16 },

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// Browser session failures
#[derive(Debug, Error)]
pub enum PageError {
    #[error("could not open a browser session: {0}")]
    Session(String),

    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("{action} timed out after {secs}s")]
    Timeout { action: String, secs: u64 },

    #[error("no element at index {index} for {target}")]
    MissingElement { target: String, index: usize },

    #[error("unexpected script result: {0}")]
    Script(String),
}

/// Failures while turning one candidate into a section
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}
