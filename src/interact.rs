//! Bounded exploratory automation of a rendered page.
//!
//! The automator walks a fixed, forward-only sequence of stages:
//!
//! ```text
//! Idle -> ClickingTabs -> ClickingLoadMore -> Paginating -> Done
//!                                                  \-> Scrolling -> Done
//! ```
//!
//! Scrolling is entered only when pagination found no "next" control on its
//! first look. Every stage has a fixed attempt budget, and a failing or
//! missing control ends that stage early without aborting the run.

use crate::config::{InteractionConfig, TimeoutConfig};
use crate::error::{ErrorLog, Phase};
use crate::fetchers::{Page, Target, bounded};
use crate::parsers::PageSource;
use crate::results::InteractionRecord;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Tab-like controls, tried in order; the first selector with matches wins
pub const TAB_TARGETS: &[Target] = &[
    Target::Css(r#"[role="tab"]"#),
    Target::Css("button[aria-controls]"),
    Target::Css("[data-tab]"),
    Target::Css(".tab"),
];

pub const LOAD_MORE_TARGETS: &[Target] = &[
    Target::XPath(
        "//*[self::button or self::a or @role='button'][\
         contains(translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'load more') or \
         contains(translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'show more') or \
         contains(translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'see more') or \
         contains(translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'view more')]",
    ),
    Target::Css(r#"[class*="load-more"]"#),
    Target::Css(r#"[class*="show-more"]"#),
];

pub const NEXT_PAGE_TARGETS: &[Target] = &[
    Target::Css(r#"a[rel="next"]"#),
    Target::Css(r#"a[aria-label*="Next"], a[aria-label*="next"]"#),
    Target::Css(".pagination .next a, .pagination a.next"),
    Target::XPath(
        "//a[translate(normalize-space(.), 'NEXT', 'next') = 'next' or \
         starts-with(translate(normalize-space(.), 'NEXT', 'next'), 'next ') or \
         normalize-space(.) = '›' or normalize-space(.) = '»']",
    ),
];

const NAVIGATION_POLL: Duration = Duration::from_millis(200);

/// Automator states, in the only order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ClickingTabs,
    ClickingLoadMore,
    Paginating,
    Scrolling,
    Done,
}

/// What pagination found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pagination {
    /// No "next" control on the first look
    Unavailable,
    /// A control was found, whether or not following it worked
    Attempted,
}

/// What the automator hands back once it reaches `Done`
#[derive(Debug, Clone)]
pub struct Automation {
    pub record: InteractionRecord,

    /// Pages left behind through pagination, captured just before leaving
    pub previous_pages: Vec<PageSource>,

    /// URL of the page the session ended on
    pub current_url: Url,

    /// Stages visited, in order
    pub stages: Vec<Stage>,
}

/// Drives one live page through the interaction stages
pub struct Automator<'a> {
    page: &'a dyn Page,
    config: InteractionConfig,
    timeouts: TimeoutConfig,
    record: InteractionRecord,
    previous_pages: Vec<PageSource>,
    current_url: Url,
}

impl<'a> Automator<'a> {
    pub fn new(
        page: &'a dyn Page,
        origin: Url,
        config: &InteractionConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            page,
            config: config.bounded(),
            timeouts: timeouts.clone(),
            record: InteractionRecord::visited(origin.as_str()),
            previous_pages: Vec::new(),
            current_url: origin,
        }
    }

    /// Run every stage to completion. Never fails; problems land in `errors`.
    pub async fn run(mut self, errors: &mut ErrorLog) -> Automation {
        let mut stage = Stage::Idle;
        let mut stages = vec![stage];

        while stage != Stage::Done {
            stage = match stage {
                Stage::Idle => Stage::ClickingTabs,
                Stage::ClickingTabs => {
                    self.click_tabs(errors).await;
                    Stage::ClickingLoadMore
                }
                Stage::ClickingLoadMore => {
                    self.click_load_more(errors).await;
                    Stage::Paginating
                }
                Stage::Paginating => match self.paginate(errors).await {
                    Pagination::Unavailable => Stage::Scrolling,
                    Pagination::Attempted => Stage::Done,
                },
                Stage::Scrolling => {
                    self.scroll(errors).await;
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
            ::log::trace!("Automator entered {:?}", stage);
            stages.push(stage);
        }

        ::log::info!(
            "Interactions done: {} clicks, {} scrolls, {} pages",
            self.record.clicks.len(),
            self.record.scrolls,
            self.record.pages.len()
        );

        Automation {
            record: self.record,
            previous_pages: self.previous_pages,
            current_url: self.current_url,
            stages,
        }
    }

    async fn click_tabs(&mut self, errors: &mut ErrorLog) {
        let Some((target, labels)) = self.locate(TAB_TARGETS).await else {
            ::log::debug!("No tab controls found");
            return;
        };
        if labels.len() < 2 {
            ::log::debug!("Single {} control is not a tab group", target);
            return;
        }

        for (index, label) in labels.iter().enumerate().take(self.config.max_tabs) {
            match self.step("clicking tab", self.page.click(target, index)).await {
                Ok(()) => {
                    self.record.clicks.push(describe("tab", label, target, index));
                    self.settle(self.config.settle()).await;
                }
                Err(e) => errors.push(
                    Phase::Interact,
                    format!("tab {} ({} [{}]) could not be clicked: {}", label, target, index, e),
                ),
            }
        }
    }

    async fn click_load_more(&mut self, errors: &mut ErrorLog) {
        for attempt in 0..self.config.max_load_more {
            // The control may move or disappear after each click
            let Some((target, labels)) = self.locate(LOAD_MORE_TARGETS).await else {
                ::log::debug!("No load-more control after {} clicks", attempt);
                return;
            };

            let label = labels.first().map(String::as_str).unwrap_or_default();
            match self.step("clicking load more", self.page.click(target, 0)).await {
                Ok(()) => {
                    self.record.clicks.push(describe("load more", label, target, 0));
                    self.settle(self.config.settle()).await;
                }
                Err(e) => {
                    errors.push(
                        Phase::Interact,
                        format!("load-more control ({}) could not be clicked: {}", target, e),
                    );
                    return;
                }
            }
        }
    }

    async fn paginate(&mut self, errors: &mut ErrorLog) -> Pagination {
        let mut outcome = Pagination::Unavailable;

        while self.record.pages.len() < self.config.max_pages {
            let Some((target, _)) = self.locate(NEXT_PAGE_TARGETS).await else {
                ::log::debug!("No further next-page control on {}", self.current_url);
                break;
            };
            outcome = Pagination::Attempted;

            let leaving = match self.step("reading page source", self.page.source()).await {
                Ok(html) => PageSource::new(self.current_url.clone(), html),
                Err(e) => {
                    errors.push(
                        Phase::Interact,
                        format!("could not capture {} before paginating: {}", self.current_url, e),
                    );
                    break;
                }
            };

            if let Err(e) = self.step("clicking next page", self.page.click(target, 0)).await {
                errors.push(
                    Phase::Interact,
                    format!("next-page control ({}) could not be clicked: {}", target, e),
                );
                break;
            }

            let next_url = match self.await_navigation().await {
                Ok(url) => url,
                Err(e) => {
                    errors.push(
                        Phase::Interact,
                        format!("navigation after next-page click failed: {}", e),
                    );
                    break;
                }
            };

            let already_seen = self.record.pages.iter().any(|p| p == next_url.as_str());
            if next_url == self.current_url || already_seen {
                ::log::debug!("Next-page control did not lead to a new page");
                break;
            }

            ::log::info!("Paginated to {}", next_url);
            self.previous_pages.push(leaving);
            self.record.pages.push(next_url.to_string());
            self.current_url = next_url;
            self.settle(self.config.settle()).await;
        }

        outcome
    }

    async fn scroll(&mut self, errors: &mut ErrorLog) {
        let mut height = match self.step("measuring page", self.page.scroll_height()).await {
            Ok(height) => height,
            Err(e) => {
                errors.push(Phase::Interact, format!("could not measure page height: {}", e));
                return;
            }
        };

        for _ in 0..self.config.max_scrolls {
            if let Err(e) = self.step("scrolling", self.page.scroll_to_bottom()).await {
                errors.push(Phase::Interact, format!("scroll failed: {}", e));
                return;
            }
            self.record.scrolls += 1;
            self.settle(self.config.scroll_settle()).await;

            let new_height = match self.step("measuring page", self.page.scroll_height()).await {
                Ok(h) => h,
                Err(e) => {
                    errors.push(Phase::Interact, format!("could not measure page height: {}", e));
                    return;
                }
            };
            if new_height <= height {
                ::log::debug!("No new content after scroll {}", self.record.scrolls);
                return;
            }
            height = new_height;
        }
    }

    /// First target with at least one match, with the matches' labels.
    /// Query failures are not interaction failures; the next target is tried.
    async fn locate(&self, targets: &'static [Target]) -> Option<(&'static Target, Vec<String>)> {
        for target in targets {
            match self.step("locating controls", self.page.find(target)).await {
                Ok(labels) if !labels.is_empty() => return Some((target, labels)),
                Ok(_) => {}
                Err(e) => ::log::debug!("Query {} failed: {}", target, e),
            }
        }
        None
    }

    /// Wait for the URL to change after a click, then for the new document to load.
    /// Returns the unchanged URL when no navigation happens in time.
    async fn await_navigation(&self) -> Result<Url, crate::error::PageError> {
        let deadline = Instant::now() + Duration::from_secs(self.timeouts.navigation_secs);
        loop {
            let url = self.step("reading current url", self.page.current_url()).await?;
            if url != self.current_url {
                bounded(
                    self.timeouts.navigation_secs,
                    "waiting for page load",
                    self.page.wait_until_loaded(),
                )
                .await?;
                return Ok(url);
            }
            if Instant::now() >= deadline {
                return Ok(url);
            }
            tokio::time::sleep(NAVIGATION_POLL).await;
        }
    }

    async fn step<T, F>(&self, action: &str, future: F) -> Result<T, crate::error::PageError>
    where
        F: std::future::Future<Output = Result<T, crate::error::PageError>>,
    {
        bounded(self.timeouts.step_secs, action, future).await
    }

    async fn settle(&self, pause: Duration) {
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

fn describe(kind: &str, label: &str, target: &Target, index: usize) -> String {
    if label.is_empty() {
        format!("{} ({} [{}])", kind, target, index)
    } else {
        format!("{} \"{}\" ({} [{}])", kind, label, target, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeControls, FakePage};

    fn origin() -> Url {
        Url::parse("https://shop.example/list").unwrap()
    }

    fn timeouts() -> TimeoutConfig {
        TimeoutConfig {
            navigation_secs: 1,
            step_secs: 1,
            ..TimeoutConfig::default()
        }
    }

    async fn run(page: &FakePage) -> (Automation, ErrorLog) {
        let mut errors = ErrorLog::new();
        let automation = Automator::new(page, origin(), &InteractionConfig::immediate(), &timeouts())
            .run(&mut errors)
            .await;
        (automation, errors)
    }

    #[tokio::test]
    async fn test_quiet_page_scrolls_and_finishes() {
        let page = FakePage::new(origin(), FakeControls::default());
        let (automation, errors) = run(&page).await;

        assert!(errors.is_empty());
        assert!(automation.record.clicks.is_empty());
        // height never grows, so the first scroll is the last
        assert_eq!(automation.record.scrolls, 1);
        assert_eq!(automation.record.pages, vec![origin().to_string()]);
        assert_eq!(
            automation.stages,
            vec![
                Stage::Idle,
                Stage::ClickingTabs,
                Stage::ClickingLoadMore,
                Stage::Paginating,
                Stage::Scrolling,
                Stage::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_tab_is_skipped_and_logged() {
        let controls = FakeControls {
            tabs: vec![
                ("Monthly".to_string(), false),
                ("Yearly".to_string(), true),
                ("Lifetime".to_string(), false),
            ],
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, errors) = run(&page).await;

        assert_eq!(errors.count(Phase::Interact), 1);
        assert_eq!(automation.record.clicks.len(), 2);
        assert!(automation.record.clicks[0].contains("Monthly"));
        assert!(automation.record.clicks[1].contains("Lifetime"));
        assert_eq!(page.tab_clicks(), 3);
    }

    #[tokio::test]
    async fn test_lone_tab_is_not_clicked() {
        let controls = FakeControls {
            tabs: vec![("Overview".to_string(), false)],
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, errors) = run(&page).await;

        assert!(errors.is_empty());
        assert!(automation.record.clicks.is_empty());
        assert_eq!(page.tab_clicks(), 0);
    }

    #[tokio::test]
    async fn test_only_three_tabs_are_clicked() {
        let controls = FakeControls {
            tabs: (0..5).map(|i| (format!("Tab {}", i), false)).collect(),
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, _) = run(&page).await;
        assert_eq!(automation.record.clicks.len(), 3);
        assert_eq!(page.tab_clicks(), 3);
    }

    #[tokio::test]
    async fn test_load_more_stops_when_control_disappears() {
        let controls = FakeControls {
            load_more: 2,
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, errors) = run(&page).await;

        assert!(errors.is_empty());
        assert_eq!(automation.record.clicks.len(), 2);
        assert!(automation.record.clicks.iter().all(|c| c.starts_with("load more")));
    }

    #[tokio::test]
    async fn test_load_more_is_capped() {
        let controls = FakeControls {
            load_more: 10,
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, _) = run(&page).await;
        assert_eq!(automation.record.clicks.len(), 3);
    }

    #[tokio::test]
    async fn test_pagination_depth_is_bounded_and_excludes_scrolling() {
        let controls = FakeControls {
            next_pages: 4,
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, errors) = run(&page).await;

        assert!(errors.is_empty());
        assert_eq!(automation.record.pages.len(), 3);
        assert_eq!(automation.record.scrolls, 0);
        assert_eq!(automation.previous_pages.len(), 2);
        assert_eq!(automation.previous_pages[0].url, origin());
        assert_eq!(automation.current_url.as_str(), automation.record.pages[2]);
        assert_eq!(page.next_clicks(), 2);
        assert!(!automation.stages.contains(&Stage::Scrolling));
    }

    #[tokio::test]
    async fn test_infinite_scroll_stops_on_height_plateau() {
        let controls = FakeControls {
            heights: vec![1000, 2000, 2000],
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, _) = run(&page).await;
        assert_eq!(automation.record.scrolls, 2);
        assert_eq!(automation.record.pages.len(), 1);
    }

    #[tokio::test]
    async fn test_infinite_scroll_is_capped() {
        let controls = FakeControls {
            heights: vec![1000, 2000, 3000, 4000, 5000, 6000],
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, _) = run(&page).await;
        assert_eq!(automation.record.scrolls, 3);
    }

    #[tokio::test]
    async fn test_broken_scroll_is_recorded() {
        let controls = FakeControls {
            scroll_fails: true,
            ..FakeControls::default()
        };
        let page = FakePage::new(origin(), controls);
        let (automation, errors) = run(&page).await;
        assert_eq!(automation.record.scrolls, 0);
        assert_eq!(errors.count(Phase::Interact), 1);
    }
}
