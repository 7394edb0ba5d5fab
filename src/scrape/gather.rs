//! Read the top-level forums off the forum index.

use tracing::info;

use super::selectors::FORUM_LINKS;
use super::{ScrapeError, Settler};
use crate::browser::BrowserSession;
use crate::config::SiteConfig;
use crate::models::ForumHandle;

/// Handles for every forum and subforum anchor on the index, in document order.
pub async fn gather_base_forums(
    session: &mut dyn BrowserSession,
    settler: &Settler,
    site: &SiteConfig,
) -> Result<Vec<ForumHandle>, ScrapeError> {
    session.goto(&site.forum_root()).await?;
    settler.settle(session).await?;

    let forums: Vec<ForumHandle> = session
        .links(FORUM_LINKS)
        .await?
        .into_iter()
        .map(|link| ForumHandle {
            url: link.href,
            title: link.text.trim().to_string(),
        })
        .collect();

    info!("Found {} forums at {}", forums.len(), site.forum_root());
    Ok(forums)
}
