use crate::config::ScraperConfig;
use crate::error::{ErrorLog, PageError, Phase};
use crate::fetchers::{Browser, Page, bounded};
use crate::filter::NoiseFilter;
use crate::interact::Automator;
use crate::parsers::PageSource;
use crate::results::InteractionRecord;
use url::Url;

/// Pages captured from one rendered session
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Origin page first, then every page reached through pagination
    pub pages: Vec<PageSource>,
    pub interactions: InteractionRecord,
}

/// Fetch a page through a browser session, exploring it with the interaction automator.
///
/// The session is always closed before returning, whatever happened inside it.
pub async fn render(
    browser: &dyn Browser,
    url: &Url,
    config: &ScraperConfig,
    noise: &NoiseFilter,
    errors: &mut ErrorLog,
) -> Result<Rendered, PageError> {
    let mut page = bounded(config.timeouts.session_secs, "opening browser session", browser.open()).await?;
    ::log::debug!("Browser session opened for {}", url);

    let outcome = drive(page.as_ref(), url, config, noise, errors).await;

    match bounded(config.timeouts.step_secs, "closing browser session", page.close()).await {
        Ok(()) => ::log::debug!("Browser session closed"),
        Err(e) => ::log::warn!("Failed to close browser session: {}", e),
    }

    outcome
}

async fn drive(
    page: &dyn Page,
    url: &Url,
    config: &ScraperConfig,
    noise: &NoiseFilter,
    errors: &mut ErrorLog,
) -> Result<Rendered, PageError> {
    let timeouts = &config.timeouts;

    bounded(timeouts.navigation_secs, "navigating", page.goto(url)).await?;
    if let Err(e) = bounded(timeouts.navigation_secs, "waiting for page load", page.wait_until_loaded()).await {
        errors.push(Phase::Render, format!("{} did not finish loading: {}", url, e));
    }
    let settle = config.interaction.settle();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    let selectors: Vec<String> = noise.selectors().map(str::to_string).collect();
    match bounded(timeouts.step_secs, "removing overlays", page.remove_noise(&selectors, noise.naming_pattern())).await {
        Ok(removed) => ::log::debug!("Removed {} overlays in page", removed),
        Err(e) => ::log::debug!("In-page noise removal failed: {}", e),
    }

    let origin = match bounded(timeouts.step_secs, "reading current url", page.current_url()).await {
        Ok(current) => current,
        Err(_) => url.clone(),
    };

    let automation = Automator::new(page, origin, &config.interaction, timeouts)
        .run(errors)
        .await;

    let mut pages = automation.previous_pages;
    match bounded(timeouts.step_secs, "reading page source", page.source()).await {
        Ok(html) => pages.push(PageSource::new(automation.current_url, html)),
        Err(e) if !pages.is_empty() => {
            errors.push(
                Phase::Render,
                format!("could not read final page {}: {}", automation.current_url, e),
            );
        }
        Err(e) => return Err(e),
    }

    ::log::info!("Rendered {} page(s) starting at {}", pages.len(), url);
    Ok(Rendered {
        pages,
        interactions: automation.record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionConfig;
    use crate::testing::{FakeBrowser, FakeControls, FakePage};

    fn url() -> Url {
        Url::parse("https://app.example/").unwrap()
    }

    fn config() -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.interaction = InteractionConfig::immediate();
        config.timeouts.step_secs = 1;
        config.timeouts.navigation_secs = 1;
        config
    }

    fn noise() -> NoiseFilter {
        NoiseFilter::new(&[]).unwrap()
    }

    #[tokio::test]
    async fn test_render_returns_final_page_and_closes_session() {
        let page = FakePage::new(url(), FakeControls::default())
            .with_documents(vec!["<main><h1>Ready</h1></main>".to_string()]);
        let browser = FakeBrowser::new(page);
        let mut errors = ErrorLog::new();

        let rendered = render(&browser, &url(), &config(), &noise(), &mut errors)
            .await
            .unwrap();

        assert_eq!(rendered.pages.len(), 1);
        assert_eq!(rendered.pages[0].url, url());
        assert!(rendered.pages[0].html.contains("Ready"));
        assert_eq!(rendered.interactions.pages, vec![url().to_string()]);
        assert_eq!(browser.opens(), 1);
        assert_eq!(browser.page().closes(), 1);
        assert_eq!(browser.page().noise_removals(), 1);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_session_is_closed_when_navigation_fails() {
        let page = FakePage::new(url(), FakeControls::default()).failing_navigation();
        let browser = FakeBrowser::new(page);
        let mut errors = ErrorLog::new();

        let result = render(&browser, &url(), &config(), &noise(), &mut errors).await;

        assert!(result.is_err());
        assert_eq!(browser.page().closes(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_browser_is_an_error() {
        let browser = FakeBrowser::unavailable(url());
        let mut errors = ErrorLog::new();

        let result = render(&browser, &url(), &config(), &noise(), &mut errors).await;

        assert!(matches!(result, Err(PageError::Session(_))));
        assert_eq!(browser.page().closes(), 0);
    }

    #[tokio::test]
    async fn test_paginated_pages_are_all_captured() {
        let controls = FakeControls {
            next_pages: 2,
            ..FakeControls::default()
        };
        let page = FakePage::new(url(), controls).with_documents(vec![
            "<main>one</main>".to_string(),
            "<main>two</main>".to_string(),
            "<main>three</main>".to_string(),
        ]);
        let browser = FakeBrowser::new(page);
        let mut errors = ErrorLog::new();

        let rendered = render(&browser, &url(), &config(), &noise(), &mut errors)
            .await
            .unwrap();

        let bodies: Vec<&str> = rendered.pages.iter().map(|p| p.html.as_str()).collect();
        assert_eq!(bodies, vec!["<main>one</main>", "<main>two</main>", "<main>three</main>"]);
        assert_eq!(rendered.pages[2].url.as_str(), "https://app.example/?page=3");
        assert_eq!(rendered.interactions.scrolls, 0);
    }

    #[tokio::test]
    async fn test_unanswered_close_does_not_hold_the_result() {
        let page = FakePage::new(url(), FakeControls::default())
            .with_documents(vec!["<main><h1>Ready</h1></main>".to_string()])
            .hanging_on_close();
        let browser = FakeBrowser::new(page);
        let mut errors = ErrorLog::new();

        let rendered = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            render(&browser, &url(), &config(), &noise(), &mut errors),
        )
        .await
        .expect("render should give up on the close after the step timeout")
        .unwrap();

        assert_eq!(rendered.pages.len(), 1);
        assert_eq!(browser.page().closes(), 1);
    }
}
