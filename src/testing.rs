//! Scripted stand-ins for the HTTP and browser collaborators

use crate::error::{FetchError, PageError};
use crate::fetchers::{Browser, Fetcher, Page, Target};
use crate::interact::{LOAD_MORE_TARGETS, NEXT_PAGE_TARGETS, TAB_TARGETS};
use crate::parsers::PageSource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Interactive controls a fake page exposes
#[derive(Debug, Clone, Default)]
pub struct FakeControls {
    /// Tab labels and whether clicking them throws
    pub tabs: Vec<(String, bool)>,
    /// How many times the load-more control can be clicked before it disappears
    pub load_more: usize,
    /// Length of the "next page" chain after the origin
    pub next_pages: usize,
    /// Successive scroll heights; the last one repeats
    pub heights: Vec<u64>,
    pub scroll_fails: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    url: Option<Url>,
    page_index: usize,
    load_more_left: usize,
    heights_read: usize,
    tab_clicks: usize,
    next_clicks: usize,
}

/// A browser page that answers from a script instead of a real DOM
#[derive(Debug, Clone)]
pub struct FakePage {
    origin: Url,
    controls: FakeControls,
    /// HTML served per page index; the last entry repeats
    documents: Vec<String>,
    fail_goto: bool,
    hang_on_close: bool,
    state: Arc<Mutex<FakeState>>,
    closes: Arc<AtomicUsize>,
    noise_removals: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(origin: Url, controls: FakeControls) -> Self {
        let state = FakeState {
            url: Some(origin.clone()),
            load_more_left: controls.load_more,
            ..FakeState::default()
        };
        Self {
            origin,
            controls,
            documents: vec!["<html><body><p>fake</p></body></html>".to_string()],
            fail_goto: false,
            hang_on_close: false,
            state: Arc::new(Mutex::new(state)),
            closes: Arc::new(AtomicUsize::new(0)),
            noise_removals: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.documents = documents;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_goto = true;
        self
    }

    /// A session whose close request never gets an answer
    pub fn hanging_on_close(mut self) -> Self {
        self.hang_on_close = true;
        self
    }

    pub fn tab_clicks(&self) -> usize {
        self.state.lock().unwrap().tab_clicks
    }

    pub fn next_clicks(&self) -> usize {
        self.state.lock().unwrap().next_clicks
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn noise_removals(&self) -> usize {
        self.noise_removals.load(Ordering::SeqCst)
    }

    fn page_url(&self, index: usize) -> Url {
        if index == 0 {
            return self.origin.clone();
        }
        let mut url = self.origin.clone();
        url.set_query(Some(&format!("page={}", index + 1)));
        url
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &Url) -> Result<(), PageError> {
        if self.fail_goto {
            return Err(PageError::Script(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)));
        }
        let mut state = self.state.lock().unwrap();
        state.url = Some(url.clone());
        state.page_index = 0;
        Ok(())
    }

    async fn wait_until_loaded(&self) -> Result<(), PageError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<Url, PageError> {
        let state = self.state.lock().unwrap();
        Ok(state.url.clone().unwrap_or_else(|| self.origin.clone()))
    }

    async fn source(&self) -> Result<String, PageError> {
        let state = self.state.lock().unwrap();
        let index = state.page_index.min(self.documents.len().saturating_sub(1));
        Ok(self.documents.get(index).cloned().unwrap_or_default())
    }

    async fn find(&self, target: &Target) -> Result<Vec<String>, PageError> {
        let state = self.state.lock().unwrap();
        if *target == TAB_TARGETS[0] {
            return Ok(self.controls.tabs.iter().map(|(label, _)| label.clone()).collect());
        }
        if *target == LOAD_MORE_TARGETS[0] && state.load_more_left > 0 {
            return Ok(vec!["Load more".to_string()]);
        }
        if *target == NEXT_PAGE_TARGETS[0] && state.page_index < self.controls.next_pages {
            return Ok(vec!["Next".to_string()]);
        }
        Ok(Vec::new())
    }

    async fn click(&self, target: &Target, index: usize) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        if *target == TAB_TARGETS[0] {
            state.tab_clicks += 1;
            return match self.controls.tabs.get(index) {
                Some((_, true)) => Err(PageError::Script("element click intercepted".to_string())),
                Some((_, false)) => Ok(()),
                None => Err(PageError::MissingElement {
                    target: target.to_string(),
                    index,
                }),
            };
        }
        if *target == LOAD_MORE_TARGETS[0] {
            state.load_more_left = state.load_more_left.saturating_sub(1);
            return Ok(());
        }
        if *target == NEXT_PAGE_TARGETS[0] {
            state.next_clicks += 1;
            state.page_index += 1;
            state.url = Some(self.page_url(state.page_index));
            return Ok(());
        }
        Err(PageError::MissingElement {
            target: target.to_string(),
            index,
        })
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        let mut state = self.state.lock().unwrap();
        let heights = &self.controls.heights;
        let height = match heights.get(state.heights_read) {
            Some(h) => *h,
            None => heights.last().copied().unwrap_or(1000),
        };
        state.heights_read += 1;
        Ok(height)
    }

    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        if self.controls.scroll_fails {
            return Err(PageError::Script("javascript error: window is undefined".to_string()));
        }
        Ok(())
    }

    async fn remove_noise(&self, _selectors: &[String], _naming: &str) -> Result<usize, PageError> {
        self.noise_removals.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn close(&mut self) -> Result<(), PageError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_close {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Hands out clones of one fake page and counts sessions
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    page: FakePage,
    refuse: bool,
    opens: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            refuse: false,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A browser whose sessions can never be opened
    pub fn unavailable(origin: Url) -> Self {
        Self {
            refuse: true,
            ..Self::new(FakePage::new(origin, FakeControls::default()))
        }
    }

    pub fn page(&self) -> &FakePage {
        &self.page
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self) -> Result<Box<dyn Page>, PageError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(PageError::Session("connection refused".to_string()));
        }
        Ok(Box::new(self.page.clone()))
    }
}

/// Serves a fixed body, or fails, and counts requests
#[derive(Debug, Clone)]
pub struct FakeFetcher {
    body: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageSource, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => Ok(PageSource::new(url.clone(), body.clone())),
            None => Err(FetchError::Status { status: 502 }),
        }
    }
}
