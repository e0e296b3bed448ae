use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Upper bound on tab clicks per scrape
pub const MAX_TAB_CLICKS: usize = 3;
/// Upper bound on "load more" clicks per scrape
pub const MAX_LOAD_MORE_CLICKS: usize = 3;
/// Upper bound on visited pages, origin included
pub const MAX_PAGES: usize = 3;
/// Upper bound on infinite-scroll steps
pub const MAX_SCROLLS: usize = 3;
/// Maximum length of a section's `rawHtml`, in characters
pub const RAW_HTML_LIMIT: usize = 1000;

/// Top-level configuration for the scrape engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Thresholds deciding whether static HTML is good enough
    #[serde(default)]
    pub sufficiency: SufficiencyConfig,

    /// Attempt budgets for the interaction automator
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Per-step timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Section extraction tunables
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User-Agent sent by both the HTTP client and the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Allow escalating to a rendered fetch
    #[serde(default = "default_true")]
    pub render: bool,

    /// Additional CSS selectors removed by the noise filter
    #[serde(default)]
    pub extra_noise_selectors: Vec<String>,
}

/// Fetch sufficiency thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SufficiencyConfig {
    /// Minimum visible body text, in characters
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Minimum number of structural landmarks
    #[serde(default = "default_min_landmarks")]
    pub min_landmarks: usize,

    /// A list needs at least this many items to count as a landmark
    #[serde(default = "default_min_list_items")]
    pub min_list_items: usize,

    /// A framework root container with less text than this is treated as unrendered
    #[serde(default = "default_min_root_text")]
    pub min_root_text: usize,
}

/// Interaction budgets; values above the hard limits are clamped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,

    #[serde(default = "default_max_load_more")]
    pub max_load_more: usize,

    /// Pagination depth, origin page included
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: usize,

    /// Pause after a click before the next action
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause after a scroll before measuring the page again
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
}

/// Timeouts for network and browser steps, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,

    #[serde(default = "default_session_secs")]
    pub session_secs: u64,

    #[serde(default = "default_navigation_secs")]
    pub navigation_secs: u64,

    /// Any single click, scroll, query or script call
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,
}

/// Section extraction tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Landmarks nested deeper than this below `<body>` are ignored
    #[serde(default = "default_max_landmark_depth")]
    pub max_landmark_depth: usize,

    /// Minimum text for a plain block to become a candidate
    #[serde(default = "default_min_block_text")]
    pub min_block_text: usize,

    #[serde(default = "default_max_fallback_blocks")]
    pub max_fallback_blocks: usize,

    /// Words used for a text-derived label (5 to 7)
    #[serde(default = "default_label_words")]
    pub label_words: usize,
}

fn default_true() -> bool {
    true
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}

fn default_min_text_length() -> usize {
    200
}

fn default_min_landmarks() -> usize {
    1
}

fn default_min_list_items() -> usize {
    3
}

fn default_min_root_text() -> usize {
    100
}

fn default_max_tabs() -> usize {
    MAX_TAB_CLICKS
}

fn default_max_load_more() -> usize {
    MAX_LOAD_MORE_CLICKS
}

fn default_max_pages() -> usize {
    MAX_PAGES
}

fn default_max_scrolls() -> usize {
    MAX_SCROLLS
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_scroll_settle_ms() -> u64 {
    2000
}

fn default_fetch_secs() -> u64 {
    30
}

fn default_session_secs() -> u64 {
    30
}

fn default_navigation_secs() -> u64 {
    30
}

fn default_step_secs() -> u64 {
    5
}

fn default_max_landmark_depth() -> usize {
    6
}

fn default_min_block_text() -> usize {
    50
}

fn default_max_fallback_blocks() -> usize {
    10
}

fn default_label_words() -> usize {
    6
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sufficiency: SufficiencyConfig::default(),
            interaction: InteractionConfig::default(),
            timeouts: TimeoutConfig::default(),
            extraction: ExtractionConfig::default(),
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            headless: true,
            render: true,
            extra_noise_selectors: Vec::new(),
        }
    }
}

impl Default for SufficiencyConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            min_landmarks: default_min_landmarks(),
            min_list_items: default_min_list_items(),
            min_root_text: default_min_root_text(),
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_tabs: default_max_tabs(),
            max_load_more: default_max_load_more(),
            max_pages: default_max_pages(),
            max_scrolls: default_max_scrolls(),
            settle_ms: default_settle_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_secs: default_fetch_secs(),
            session_secs: default_session_secs(),
            navigation_secs: default_navigation_secs(),
            step_secs: default_step_secs(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_landmark_depth: default_max_landmark_depth(),
            min_block_text: default_min_block_text(),
            max_fallback_blocks: default_max_fallback_blocks(),
            label_words: default_label_words(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override the WebDriver URL from the environment, if set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }
}

impl InteractionConfig {
    /// Budgets with the hard per-scrape limits applied
    pub fn bounded(&self) -> Self {
        Self {
            max_tabs: self.max_tabs.min(MAX_TAB_CLICKS),
            max_load_more: self.max_load_more.min(MAX_LOAD_MORE_CLICKS),
            max_pages: self.max_pages.clamp(1, MAX_PAGES),
            max_scrolls: self.max_scrolls.min(MAX_SCROLLS),
            settle_ms: self.settle_ms,
            scroll_settle_ms: self.scroll_settle_ms,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    /// No settle pauses at all; used by tests driving a scripted page
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            scroll_settle_ms: 0,
            ..Self::default()
        }
    }
}

impl ExtractionConfig {
    pub fn label_words(&self) -> usize {
        self.label_words.clamp(5, 7)
    }
}
