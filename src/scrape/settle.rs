//! Wait for a page to finish loading and rendering.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::ScrapeError;
use crate::browser::BrowserSession;
use crate::config::Timing;

/// Document-ready poll followed by a fixed quiescence pause.
#[derive(Debug, Clone, Copy)]
pub struct Settler {
    ready_timeout: Duration,
    pause: Duration,
    poll_interval: Duration,
}

impl Settler {
    pub fn new(timing: &Timing) -> Self {
        Self {
            ready_timeout: timing.ready_timeout,
            pause: timing.settle_pause,
            poll_interval: timing.poll_interval,
        }
    }

    /// Return once `document.readyState` is "complete" and the pause has elapsed.
    ///
    /// Driver errors while polling (e.g. the execution context is being
    /// replaced mid-navigation) count as "not ready yet".
    pub async fn settle(&self, session: &mut dyn BrowserSession) -> Result<(), ScrapeError> {
        let started = Instant::now();
        loop {
            match session.ready_state().await {
                Ok(state) if state == "complete" => break,
                Ok(state) => debug!("Ready state: {}", state),
                Err(e) => debug!("Could not read ready state: {}", e),
            }

            if started.elapsed() >= self.ready_timeout {
                let url = session.current_url().await.unwrap_or_default();
                return Err(ScrapeError::PageLoadTimeout {
                    url,
                    waited: self.ready_timeout,
                });
            }
            sleep(self.poll_interval).await;
        }

        if !self.pause.is_zero() {
            sleep(self.pause).await;
        }
        Ok(())
    }
}
