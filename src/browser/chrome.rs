//! Chrome-backed sessions over the DevTools protocol (chromiumoxide).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserSession, DriverError, Link, SessionFactory};
use crate::config::BrowserEngineConfig;

/// Empties an input/textarea and notifies listeners, like a user clearing it.
const CLEAR_VALUE_FN: &str = r#"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
}"#;

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        DriverError::Protocol(e.to_string())
    }
}

/// Opens one browser (or one tab on a remote browser) per session.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    config: BrowserEngineConfig,
}

impl ChromeSessionFactory {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }

    /// Find a Chrome executable on well-known paths or `PATH`.
    fn find_chrome() -> Result<PathBuf, DriverError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(DriverError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
                .to_string(),
        ))
    }

    async fn launch(&self) -> Result<ChromeSession, DriverError> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        // Each browser gets its own profile so parallel sessions do not share cookies.
        let profile = TempDir::new().map_err(|e| DriverError::Launch(e.to_string()))?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile.path())
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| DriverError::Launch(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler_task,
            owns_process: true,
            _profile: Some(profile),
        })
    }

    /// Open a new tab on a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<ChromeSession, DriverError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| DriverError::Launch(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| DriverError::Launch(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DriverError::Launch("No webSocketDebuggerUrl in response".into()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler_task,
            owns_process: false,
            _profile: None,
        })
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, DriverError> {
        let session = match self.config.remote_url.clone() {
            Some(remote_url) => self.connect_remote(&remote_url).await?,
            None => self.launch().await?,
        };
        Ok(Box::new(session))
    }
}

/// One Chrome page plus the browser it belongs to.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    /// False when attached to a remote browser we must not shut down.
    owns_process: bool,
    _profile: Option<TempDir>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, DriverError> {
        self.page.as_ref().ok_or(DriverError::Closed)
    }

    async fn elements(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        Ok(self.page()?.find_elements(selector).await?)
    }

    async fn nth(&self, selector: &str, index: usize) -> Result<Element, DriverError> {
        self.elements(selector)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| DriverError::not_found(selector, index))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to {}", url);
        self.page()?.goto(url).await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.page()?.url().await?.unwrap_or_default())
    }

    async fn ready_state(&mut self) -> Result<String, DriverError> {
        let result = self.page()?.evaluate("document.readyState").await?;
        result
            .into_value::<String>()
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }

    async fn count(&mut self, selector: &str) -> Result<usize, DriverError> {
        Ok(self.elements(selector).await?.len())
    }

    async fn texts(&mut self, selector: &str) -> Result<Vec<String>, DriverError> {
        let mut texts = Vec::new();
        for element in self.elements(selector).await? {
            texts.push(element.inner_text().await?.unwrap_or_default());
        }
        Ok(texts)
    }

    async fn links(&mut self, selector: &str) -> Result<Vec<Link>, DriverError> {
        let mut links = Vec::new();
        for element in self.elements(selector).await? {
            // The property (unlike the attribute) is already resolved to an absolute URL.
            let href = element
                .property("href")
                .await?
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let text = element.inner_text().await?.unwrap_or_default();
            links.push(Link { href, text });
        }
        Ok(links)
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        self.nth(selector, index).await?.click().await?;
        Ok(())
    }

    async fn clear(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        self.nth(selector, index)
            .await?
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await?;
        Ok(())
    }

    async fn type_text(
        &mut self,
        selector: &str,
        index: usize,
        text: &str,
    ) -> Result<(), DriverError> {
        let element = self.nth(selector, index).await?;
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn value(&mut self, selector: &str, index: usize) -> Result<String, DriverError> {
        let value = self.nth(selector, index).await?.property("value").await?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if self.owns_process {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                let _ = browser.wait().await;
            }
        }
        self.handler_task.abort();
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
