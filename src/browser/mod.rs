//! Browser session capability.
//!
//! Scraping code talks to the browser only through [`BrowserSession`], which
//! addresses elements by CSS selector plus a 0-based index and re-queries the
//! DOM on every call. The Chrome implementation lives behind the `browser`
//! feature; tests drive the same traits with an in-memory site.

#[cfg(feature = "browser")]
mod chrome;

#[cfg(feature = "browser")]
pub use chrome::{ChromeSession, ChromeSessionFactory};

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the browser driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("No element #{index} matching '{selector}'")]
    NotFound { selector: String, index: usize },
    #[error("Browser protocol error: {0}")]
    Protocol(String),
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Browser session already closed")]
    Closed,
}

impl DriverError {
    pub fn not_found(selector: &str, index: usize) -> Self {
        Self::NotFound {
            selector: selector.to_string(),
            index,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Anchor read from the page: resolved `href` plus visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// A driven browser tab.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url` and wait for the navigation to commit.
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// Value of `document.readyState`.
    async fn ready_state(&mut self) -> Result<String, DriverError>;

    /// Number of elements matching `selector`.
    async fn count(&mut self, selector: &str) -> Result<usize, DriverError>;

    /// Visible text of every element matching `selector`, in document order.
    async fn texts(&mut self, selector: &str) -> Result<Vec<String>, DriverError>;

    /// Anchors matching `selector`, in document order.
    async fn links(&mut self, selector: &str) -> Result<Vec<Link>, DriverError>;

    async fn click(&mut self, selector: &str, index: usize) -> Result<(), DriverError>;

    /// Empty the value of an input or textarea.
    async fn clear(&mut self, selector: &str, index: usize) -> Result<(), DriverError>;

    async fn type_text(
        &mut self,
        selector: &str,
        index: usize,
        text: &str,
    ) -> Result<(), DriverError>;

    /// Current `value` property of an input or textarea.
    async fn value(&mut self, selector: &str, index: usize) -> Result<String, DriverError>;

    /// Dispose of the browser behind this session.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Source of fresh, unauthenticated browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, DriverError>;
}
