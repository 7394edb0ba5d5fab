//! In-memory forum site for driving the scraper without a browser.
//!
//! Pages are keyed by absolute URL and map CSS selectors to elements. A click
//! on an element with a target navigates there; textarea values are reloaded
//! from the page on every navigation, like a real document.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use forumvac::browser::{BrowserSession, DriverError, Link, SessionFactory};
use forumvac::config::{
    BrowserEngineConfig, Concurrency, Credentials, ForumFilter, ScrapeConfig, SiteConfig,
    Timing,
};
use forumvac::scrape::selectors::{
    FORUM_LINKS, LOGIN_PASSWORD, LOGIN_SUBMIT, LOGIN_USERNAME, NEXT_PAGE, QUOTE_BUTTONS,
    REPLY_TEXTAREA, THREAD_LINKS, USERNAMES,
};

pub const BASE: &str = "https://forum.test";
pub const FORUM_ROOT: &str = "/forums";

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub text: String,
    pub href: Option<String>,
    /// Page a click navigates to.
    pub target: Option<String>,
    pub value: String,
}

impl Element {
    pub fn link(path: &str, text: &str) -> Self {
        Self {
            text: text.to_string(),
            href: Some(url(path)),
            ..Self::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn button(target: &str) -> Self {
        Self {
            target: Some(url(target)),
            ..Self::default()
        }
    }

    pub fn input() -> Self {
        Self::default()
    }

    pub fn textarea(value: &str) -> Self {
        Self {
            value: value.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub elements: HashMap<String, Vec<Element>>,
    pub ready_state: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            ready_state: "complete".to_string(),
        }
    }
}

impl Page {
    pub fn with(mut self, selector: &str, elements: Vec<Element>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    /// A page whose document never finishes loading.
    pub fn stuck(mut self) -> Self {
        self.ready_state = "loading".to_string();
        self
    }
}

/// One post on a thread page: who wrote it and what the quote click yields.
pub struct FakePost<'a> {
    pub user: &'a str,
    pub reply_path: &'a str,
    pub quote_value: &'a str,
}

#[derive(Debug, Default)]
pub struct SiteLog {
    pub opened: usize,
    pub closed: usize,
    /// Sessions dropped without `close`, e.g. when their worker was aborted.
    pub abandoned: usize,
    pub typed: Vec<(String, String)>,
    pub visits: Vec<String>,
    clears_per_url: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, Page>,
    /// `(url, n)`: the n-th textarea clear issued on `url` fails.
    failing_clears: HashSet<(String, usize)>,
    log: Mutex<SiteLog>,
}

impl FakeSite {
    /// A site with a working login form at `/login`.
    pub fn new() -> Self {
        let mut site = Self::default();
        site.page(
            "/login",
            Page::default()
                .with(LOGIN_USERNAME, vec![Element::input()])
                .with(LOGIN_PASSWORD, vec![Element::input()])
                .with(LOGIN_SUBMIT, vec![Element::button("/")]),
        );
        site
    }

    pub fn page(&mut self, path: &str, page: Page) -> &mut Self {
        self.pages.insert(url(path), page);
        self
    }

    pub fn forum_index(&mut self, forums: &[(&str, &str)]) -> &mut Self {
        let links = forums
            .iter()
            .map(|(title, path)| Element::link(path, title))
            .collect();
        self.page(FORUM_ROOT, Page::default().with(FORUM_LINKS, links))
    }

    pub fn listing(
        &mut self,
        path: &str,
        threads: &[(&str, &str)],
        next: Option<&str>,
    ) -> &mut Self {
        let links = threads
            .iter()
            .map(|(title, path)| Element::link(path, title))
            .collect();
        let mut page = Page::default().with(THREAD_LINKS, links);
        if let Some(next) = next {
            page = page.with(NEXT_PAGE, vec![Element::button(next)]);
        }
        self.page(path, page)
    }

    /// A thread page plus the reply page each quote glyph leads to.
    pub fn thread_page(
        &mut self,
        path: &str,
        posts: &[FakePost<'_>],
        next: Option<&str>,
    ) -> &mut Self {
        let mut page = Page::default()
            .with(
                USERNAMES,
                posts.iter().map(|p| Element::link("/u", p.user)).collect(),
            )
            .with(
                QUOTE_BUTTONS,
                posts.iter().map(|p| Element::button(p.reply_path)).collect(),
            )
            .with(REPLY_TEXTAREA, vec![Element::textarea("")]);
        if let Some(next) = next {
            page = page.with(NEXT_PAGE, vec![Element::button(next)]);
        }
        self.page(path, page);

        for post in posts {
            self.page(
                post.reply_path,
                Page::default()
                    .with(REPLY_TEXTAREA, vec![Element::textarea(post.quote_value)]),
            );
        }
        self
    }

    pub fn fail_clear(&mut self, path: &str, nth: usize) -> &mut Self {
        self.failing_clears.insert((url(path), nth));
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, SiteLog> {
        self.log.lock().unwrap()
    }

    pub fn into_factory(self) -> Arc<FakeFactory> {
        Arc::new(FakeFactory {
            site: Arc::new(self),
        })
    }
}

pub struct FakeFactory {
    pub site: Arc<FakeSite>,
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, DriverError> {
        self.site.log().opened += 1;
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            url: "about:blank".to_string(),
            page: Page::default(),
            closed: false,
        }))
    }
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    url: String,
    /// Live copy of the current page; input values change here.
    page: Page,
    closed: bool,
}

impl FakeSession {
    fn navigate(&mut self, target: &str) {
        self.url = target.to_string();
        self.page = self.site.pages.get(target).cloned().unwrap_or_default();
        self.site.log().visits.push(target.to_string());
    }

    fn check_open(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    fn element_mut(&mut self, selector: &str, index: usize) -> Result<&mut Element, DriverError> {
        self.page
            .elements
            .get_mut(selector)
            .and_then(|els| els.get_mut(index))
            .ok_or_else(|| DriverError::not_found(selector, index))
    }

    fn elements(&self, selector: &str) -> &[Element] {
        self.page
            .elements
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.check_open()?;
        self.navigate(url);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.check_open()?;
        Ok(self.url.clone())
    }

    async fn ready_state(&mut self) -> Result<String, DriverError> {
        self.check_open()?;
        Ok(self.page.ready_state.clone())
    }

    async fn count(&mut self, selector: &str) -> Result<usize, DriverError> {
        self.check_open()?;
        Ok(self.elements(selector).len())
    }

    async fn texts(&mut self, selector: &str) -> Result<Vec<String>, DriverError> {
        self.check_open()?;
        Ok(self.elements(selector).iter().map(|e| e.text.clone()).collect())
    }

    async fn links(&mut self, selector: &str) -> Result<Vec<Link>, DriverError> {
        self.check_open()?;
        Ok(self
            .elements(selector)
            .iter()
            .filter_map(|e| {
                e.href.as_ref().map(|href| Link {
                    href: href.clone(),
                    text: e.text.clone(),
                })
            })
            .collect())
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        self.check_open()?;
        let target = self.element_mut(selector, index)?.target.clone();
        if let Some(target) = target {
            self.navigate(&target);
        }
        Ok(())
    }

    async fn clear(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        self.check_open()?;
        let nth = {
            let mut log = self.site.log();
            let count = log.clears_per_url.entry(self.url.clone()).or_default();
            *count += 1;
            *count
        };
        if self.site.failing_clears.contains(&(self.url.clone(), nth)) {
            return Err(DriverError::Protocol("element is not interactable".to_string()));
        }
        self.element_mut(selector, index)?.value.clear();
        Ok(())
    }

    async fn type_text(
        &mut self,
        selector: &str,
        index: usize,
        text: &str,
    ) -> Result<(), DriverError> {
        self.check_open()?;
        self.element_mut(selector, index)?.value.push_str(text);
        self.site
            .log()
            .typed
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn value(&mut self, selector: &str, index: usize) -> Result<String, DriverError> {
        self.check_open()?;
        Ok(self.element_mut(selector, index)?.value.clone())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.check_open()?;
        self.closed = true;
        self.site.log().closed += 1;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.site.log().abandoned += 1;
        }
    }
}

/// Config pointing at the fake site, with every wait zeroed.
pub fn test_config(output_dir: &Path, concurrency: Concurrency) -> ScrapeConfig {
    ScrapeConfig {
        site: SiteConfig::new(BASE, FORUM_ROOT).unwrap(),
        credentials: Credentials {
            username: "archivist".to_string(),
            password: "hunter2".to_string(),
        },
        timing: Timing {
            ready_timeout: Duration::ZERO,
            settle_pause: Duration::ZERO,
            next_page_wait: Duration::ZERO,
            poll_interval: Duration::ZERO,
            await_limit: Duration::from_secs(60),
        },
        concurrency,
        output_dir: output_dir.to_path_buf(),
        browser: BrowserEngineConfig::default(),
        forum_filter: ForumFilter::default(),
    }
}

/// Like [`test_config`], but a page that never loads keeps its worker waiting.
pub fn stalling_config(output_dir: &Path, concurrency: Concurrency) -> ScrapeConfig {
    let mut config = test_config(output_dir, concurrency);
    config.timing.ready_timeout = Duration::from_secs(60);
    config.timing.poll_interval = Duration::from_millis(10);
    config
}
