// Re-export modules
pub mod config;
pub mod error;
pub mod fetchers;
pub mod filter;
pub mod interact;
pub mod parsers;
pub mod results;
pub mod sections;
pub mod strategy;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use error::{ErrorEntry, Phase, ScrapeError};
pub use results::{ScrapeResponse, ScrapeResult, Section, SectionType};
pub use strategy::Strategy;

use error::ErrorLog;
use fetchers::http::HttpFetcher;
use fetchers::web::WebDriverBrowser;
use fetchers::{Browser, Fetcher};
use filter::NoiseFilter;
use parsers::PageSource;
use parsers::html::extract_meta;
use results::{Meta, assemble};
use sections::classify::Classifier;
use sections::{Extractor, finalize};
use std::sync::Arc;
use strategy::StrategySelector;
use url::Url;

/// A finished scrape together with how its document was obtained
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub result: ScrapeResult,
    pub strategy: Strategy,
}

/// Main builder for scraping pages into typed sections
pub struct Scraper {
    config: ScraperConfig,
    fetcher: Arc<dyn Fetcher>,
    browser: Option<Arc<dyn Browser>>,
    noise: NoiseFilter,
    classifier: Classifier,
}

impl Scraper {
    /// Create a scraper backed by reqwest and a WebDriver browser
    pub fn new(config: ScraperConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let noise = NoiseFilter::new(&config.extra_noise_selectors)?;
        let fetcher = HttpFetcher::new(&config.user_agent, config.timeouts.fetch_secs)?;
        let browser = WebDriverBrowser::from_config(&config);

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            browser: Some(Arc::new(browser)),
            noise,
            classifier: Classifier::default(),
        })
    }

    /// Load configuration from a file
    pub fn with_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = ScraperConfig::from_file(path)?;
        config.apply_env();
        Self::new(config)
    }

    /// Replace the static fetcher
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    /// Replace the browser used for rendered fetches
    pub fn with_browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Some(Arc::new(browser));
        self
    }

    /// Never render; static content is used whatever its quality
    pub fn without_browser(mut self) -> Self {
        self.browser = None;
        self
    }

    /// Use a custom classification rule table
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape one page. Only an invalid URL is an error; every later failure
    /// is recorded in the result's `errors`.
    pub async fn scrape(&self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        Ok(self.scrape_detailed(url).await?.result)
    }

    /// Like [`Scraper::scrape`], also reporting the fetch strategy used
    pub async fn scrape_detailed(&self, url: &str) -> Result<ScrapeOutcome, ScrapeError> {
        let target = validate_url(url)?;
        ::log::info!("Scraping {}", target);

        let mut errors = ErrorLog::new();
        let selector = StrategySelector {
            config: &self.config,
            fetcher: self.fetcher.as_ref(),
            browser: self.browser.as_deref(),
            noise: &self.noise,
        };
        let fetched = selector.select(&target, &mut errors).await;

        let (meta, sections) = self.extract(&fetched.pages, &mut errors);
        ::log::info!(
            "Scraped {} ({}): {} sections, {} errors",
            target,
            fetched.strategy,
            sections.len(),
            errors.len()
        );

        Ok(ScrapeOutcome {
            result: assemble(target.as_str(), meta, sections, fetched.interactions, errors),
            strategy: fetched.strategy,
        })
    }

    /// Metadata from the origin page and sections from every page
    fn extract(&self, pages: &[PageSource], errors: &mut ErrorLog) -> (Meta, Vec<Section>) {
        if pages.is_empty() {
            errors.push(Phase::Parse, "no document was obtained");
            return (Meta::default(), Vec::new());
        }

        let extractor = Extractor::new(&self.config.extraction, &self.classifier);
        let mut meta = Meta::default();
        let mut sections = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let mut doc = page.parse();
            if index == 0 {
                meta = extract_meta(doc.html(), doc.url()).unwrap_or_else(|e| {
                    errors.push(Phase::Parse, format!("could not read metadata: {}", e));
                    Meta::default()
                });
            }
            self.noise.apply(&mut doc);
            let earlier: Vec<SectionType> = sections.iter().map(|s: &Section| s.kind).collect();
            sections.extend(extractor.extract_after(&doc, &earlier, errors));
        }

        (meta, finalize(sections))
    }
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(input: &str) -> Result<Url, ScrapeError> {
    let url = Url::parse(input.trim()).map_err(|e| ScrapeError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScrapeError::UnsupportedScheme {
                scheme: other.to_string(),
            });
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScrapeError::InvalidUrl {
            url: input.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
