pub mod http;
pub mod render;
pub mod web;

use crate::error::{FetchError, PageError};
use crate::parsers::PageSource;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Retrieves a page's HTML without executing it
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the URL and return the body together with the final (post-redirect) URL
    async fn fetch(&self, url: &Url) -> Result<PageSource, FetchError>;
}

/// Hands out browser sessions
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh session. The caller owns it and must `close` it.
    async fn open(&self) -> Result<Box<dyn Page>, PageError>;
}

/// How to find interactive controls in a live page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Css(&'static str),
    XPath(&'static str),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Css(css) => write!(f, "{}", css),
            Target::XPath(xpath) => write!(f, "xpath {}", xpath),
        }
    }
}

/// One live browser session, as the rendered fetcher and automator need it
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &Url) -> Result<(), PageError>;

    /// Resolve once the document has finished loading
    async fn wait_until_loaded(&self) -> Result<(), PageError>;

    async fn current_url(&self) -> Result<Url, PageError>;

    /// The current serialized DOM
    async fn source(&self) -> Result<String, PageError>;

    /// Visible labels of every element matching the target, in document order
    async fn find(&self, target: &Target) -> Result<Vec<String>, PageError>;

    /// Click the `index`-th element matching the target
    async fn click(&self, target: &Target, index: usize) -> Result<(), PageError>;

    async fn scroll_height(&self) -> Result<u64, PageError>;

    async fn scroll_to_bottom(&self) -> Result<(), PageError>;

    /// Remove noise subtrees in the live DOM; returns how many were removed
    async fn remove_noise(&self, selectors: &[String], naming_pattern: &str)
    -> Result<usize, PageError>;

    /// End the session
    async fn close(&mut self) -> Result<(), PageError>;
}

/// Run one browser step under a timeout
pub(crate) async fn bounded<T, F>(secs: u64, action: &str, step: F) -> Result<T, PageError>
where
    F: Future<Output = Result<T, PageError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), step).await {
        Ok(result) => result,
        Err(_) => Err(PageError::Timeout {
            action: action.to_string(),
            secs,
        }),
    }
}
