use crate::config::ScraperConfig;
use crate::error::PageError;
use crate::fetchers::{Browser, Page, Target};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Local endpoints tried when the configured WebDriver refuses a session
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Labels are read for at most this many matches per query
const MAX_LABELLED_MATCHES: usize = 25;

const READY_STATE_POLL: Duration = Duration::from_millis(250);

const SCROLL_HEIGHT_SCRIPT: &str = "return Math.max(\
    document.body ? document.body.scrollHeight : 0, \
    document.documentElement ? document.documentElement.scrollHeight : 0);";

const SCROLL_TO_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, Math.max(document.body ? document.body.scrollHeight : 0, \
    document.documentElement.scrollHeight));";

const REMOVE_NOISE_SCRIPT: &str = r#"
const selectors = arguments[0];
const naming = new RegExp(arguments[1], 'i');
const protectedTags = ['HTML', 'BODY', 'MAIN'];
let removed = 0;
const drop = (el) => {
    if (!protectedTags.includes(el.tagName) && el.isConnected) { el.remove(); removed++; }
};
for (const sel of selectors) {
    try { document.querySelectorAll(sel).forEach(drop); } catch (e) {}
}
document.querySelectorAll('[id],[class]').forEach((el) => {
    const cls = typeof el.className === 'string' ? el.className : '';
    if (naming.test(((el.id || '') + ' ' + cls).trim())) { drop(el); }
});
return removed;
"#;

/// Opens WebDriver sessions (ChromeDriver, geckodriver, Selenium) through fantoccini
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    webdriver_url: String,
    user_agent: String,
    headless: bool,
}

impl WebDriverBrowser {
    pub fn new(webdriver_url: &str, user_agent: &str, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            user_agent: user_agent.to_string(),
            headless,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(&config.webdriver_url, &config.user_agent, config.headless)
    }

    fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut chrome_args = vec![
            "--window-size=1920,1080".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        let mut firefox_args = vec!["--width=1920".to_string(), "--height=1080".to_string()];
        if self.headless {
            chrome_args.push("--headless=new".to_string());
            firefox_args.push("-headless".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({
                "args": firefox_args,
                "prefs": { "general.useragent.override": self.user_agent },
            }),
        );
        caps
    }

    async fn connect(&self, webdriver_url: &str) -> Result<Client, String> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        builder
            .connect(webdriver_url)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn Page>, PageError> {
        let first_error = match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(Box::new(WebDriverPage { client }));
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS.iter() {
            if *url == self.webdriver_url {
                continue; // Skip if it's the same as the one we already tried
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Box::new(WebDriverPage { client }));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(PageError::Session(format!(
            "{} ({})",
            self.webdriver_url, first_error
        )))
    }
}

/// A live fantoccini session
#[derive(Debug)]
pub struct WebDriverPage {
    client: Client,
}

fn locator(target: &Target) -> Locator<'static> {
    match target {
        Target::Css(css) => Locator::Css(*css),
        Target::XPath(xpath) => Locator::XPath(*xpath),
    }
}

#[async_trait]
impl Page for WebDriverPage {
    async fn goto(&self, url: &Url) -> Result<(), PageError> {
        self.client.goto(url.as_str()).await?;
        Ok(())
    }

    async fn wait_until_loaded(&self) -> Result<(), PageError> {
        loop {
            let state = self
                .client
                .execute("return document.readyState;", Vec::new())
                .await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }

    async fn current_url(&self) -> Result<Url, PageError> {
        Ok(self.client.current_url().await?)
    }

    async fn source(&self) -> Result<String, PageError> {
        Ok(self.client.source().await?)
    }

    async fn find(&self, target: &Target) -> Result<Vec<String>, PageError> {
        let elements = self.client.find_all(locator(target)).await?;
        let mut labels = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let label = if i < MAX_LABELLED_MATCHES {
                element.text().await.unwrap_or_default()
            } else {
                String::new()
            };
            labels.push(label.trim().to_string());
        }
        Ok(labels)
    }

    async fn click(&self, target: &Target, index: usize) -> Result<(), PageError> {
        let elements = self.client.find_all(locator(target)).await?;
        let element = elements.get(index).ok_or_else(|| PageError::MissingElement {
            target: target.to_string(),
            index,
        })?;
        element.click().await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        let height = self.client.execute(SCROLL_HEIGHT_SCRIPT, Vec::new()).await?;
        height
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .ok_or_else(|| PageError::Script(format!("scroll height was {}", height)))
    }

    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        self.client
            .execute(SCROLL_TO_BOTTOM_SCRIPT, Vec::new())
            .await?;
        Ok(())
    }

    async fn remove_noise(
        &self,
        selectors: &[String],
        naming_pattern: &str,
    ) -> Result<usize, PageError> {
        let removed = self
            .client
            .execute(
                REMOVE_NOISE_SCRIPT,
                vec![json!(selectors), json!(naming_pattern)],
            )
            .await?;
        Ok(removed.as_u64().unwrap_or(0) as usize)
    }

    async fn close(&mut self) -> Result<(), PageError> {
        self.client.clone().close().await?;
        Ok(())
    }
}
