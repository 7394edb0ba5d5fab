//! One worker per top-level forum, each with its own browser session.

use std::sync::Arc;

use tracing::{error, info};

use super::{extract_posts, harvest_threads, login, Paginator, ScrapeError};
use crate::archive::ArchiveWriter;
use crate::browser::{BrowserSession, SessionFactory};
use crate::config::{Credentials, SiteConfig};
use crate::models::ThreadRef;
use crate::registry::{lock_forum, ForumRegistry, ForumSlot};
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Everything a worker shares with its peers.
#[derive(Clone)]
pub struct ScrapeWorker {
    pub factory: Arc<dyn SessionFactory>,
    pub site: SiteConfig,
    pub credentials: Credentials,
    pub paginator: Paginator,
    pub registry: Arc<ForumRegistry>,
    pub writer: ArchiveWriter,
    pub shutdown: ShutdownSignal,
}

impl ScrapeWorker {
    /// Scrape the forum in registry slot `index`.
    ///
    /// On failure the whole registry is saved and a process-wide shutdown is
    /// requested before the error is returned. The session is closed on
    /// every path.
    pub async fn run(&self, index: usize) -> Result<(), ScrapeError> {
        let Some(slot) = self.registry.slot(index).cloned() else {
            return Ok(());
        };
        let title = lock_forum(&slot).title.clone().unwrap_or_default();
        info!("Worker starting on forum '{}'", title);

        let result = match self.factory.open().await {
            Ok(mut session) => {
                let result = self.scrape(session.as_mut(), &slot).await;
                if let Err(e) = session.close().await {
                    error!("Failed to close browser for '{}': {}", title, e);
                }
                result
            }
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(()) => {
                let forum = lock_forum(&slot);
                info!(
                    "Finished forum '{}': {} threads, {} posts",
                    title,
                    forum.threads.len(),
                    forum.post_count()
                );
            }
            Err(e) => {
                error!("Worker for forum '{}' failed: {}", title, e);
                self.registry.mark_abnormal();
                let report = self.writer.write_all(&self.registry);
                info!(
                    "Saved {} of {} forums after failure",
                    report.written(),
                    report.entries.len()
                );
                self.shutdown.trigger(ShutdownReason::Failed);
            }
        }
        result
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        slot: &ForumSlot,
    ) -> Result<(), ScrapeError> {
        login(session, self.paginator.settler(), &self.site, &self.credentials).await?;
        let threads = harvest_threads(session, &self.paginator, slot).await?;

        // Threads are only appended during harvesting, so indices are stable here.
        for idx in 0..threads {
            extract_posts(session, &self.paginator, slot, ThreadRef(idx)).await?;
        }
        Ok(())
    }
}
