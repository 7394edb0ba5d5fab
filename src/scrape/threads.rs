//! Collect thread handles from a forum's paginated listing.

use async_trait::async_trait;
use tracing::{debug, info};

use super::selectors::THREAD_LINKS;
use super::{PageVisitor, Paginator, ScrapeError};
use crate::browser::BrowserSession;
use crate::models::ForumThread;
use crate::registry::{lock_forum, ForumSlot};

struct ThreadListing<'a> {
    forum: &'a ForumSlot,
}

#[async_trait]
impl PageVisitor for ThreadListing<'_> {
    async fn visit(&mut self, session: &mut dyn BrowserSession) -> Result<(), ScrapeError> {
        let links = session.links(THREAD_LINKS).await?;
        debug!("Listing page has {} threads", links.len());

        // Duplicates across pages are kept as-is.
        let mut forum = lock_forum(self.forum);
        forum.threads.extend(
            links
                .into_iter()
                .map(|link| ForumThread::new(link.href, link.text)),
        );
        Ok(())
    }
}

/// Walk the forum's listing pages and append every thread to the slot.
///
/// Returns the number of threads the forum holds afterwards.
pub async fn harvest_threads(
    session: &mut dyn BrowserSession,
    paginator: &Paginator,
    forum: &ForumSlot,
) -> Result<usize, ScrapeError> {
    let url = lock_forum(forum).url.clone();
    session.goto(&url).await?;
    paginator.settler().settle(session).await?;

    let mut listing = ThreadListing { forum };
    let pages = paginator.walk(session, &mut listing).await?;

    let count = lock_forum(forum).threads.len();
    info!("Harvested {} threads over {} pages from {}", count, pages, url);
    Ok(count)
}
