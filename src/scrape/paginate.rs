//! "Next page" traversal over listing pages.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::selectors::NEXT_PAGE;
use super::{ScrapeError, Settler};
use crate::browser::BrowserSession;
use crate::config::Timing;

/// Work applied to each page of a listing.
#[async_trait]
pub trait PageVisitor: Send {
    async fn visit(&mut self, session: &mut dyn BrowserSession) -> Result<(), ScrapeError>;
}

/// Drives a visitor across every page reachable through the next-page control.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    settler: Settler,
    next_page_timeout: Duration,
    poll_interval: Duration,
}

impl Paginator {
    pub fn new(timing: &Timing) -> Self {
        Self {
            settler: Settler::new(timing),
            next_page_timeout: timing.next_page_wait,
            poll_interval: timing.poll_interval,
        }
    }

    pub fn settler(&self) -> &Settler {
        &self.settler
    }

    /// Visit the current page, then keep clicking "next" until it stops appearing.
    ///
    /// Returns the number of pages visited. The first page is always visited.
    /// Visitor failures abort the walk.
    pub async fn walk(
        &self,
        session: &mut dyn BrowserSession,
        visitor: &mut dyn PageVisitor,
    ) -> Result<usize, ScrapeError> {
        let mut pages = 0;
        loop {
            visitor.visit(session).await?;
            pages += 1;

            if !self.next_page_present(session).await? {
                break;
            }
            debug!("Advancing to page {}", pages + 1);
            session.click(NEXT_PAGE, 0).await?;
            self.settler.settle(session).await?;
        }
        Ok(pages)
    }

    /// Poll for the next-page control until it shows up or the wait times out.
    async fn next_page_present(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<bool, ScrapeError> {
        let started = Instant::now();
        loop {
            if session.count(NEXT_PAGE).await? > 0 {
                return Ok(true);
            }
            if started.elapsed() >= self.next_page_timeout {
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }
}
