//! Recover each post's source markup through the quote-reply composer.
//!
//! Rendered post bodies do not round-trip, so every post is quoted instead:
//! clicking its quote glyph fills the reply textarea with
//! `[quote=@<id>]<markup>[/quote]`, which is read back and unwrapped.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use super::selectors::{QUOTE_BUTTONS, REPLY_TEXTAREA, USERNAMES};
use super::{PageVisitor, Paginator, ScrapeError, Settler};
use crate::browser::BrowserSession;
use crate::models::{ForumThread, Post, ThreadRef};
use crate::registry::{lock_forum, ForumSlot};

static QUOTE_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*\[quote=@[0-9]+\](.*?)\[/quote\]\s*$").expect("valid quote regex")
});

/// Strip the outer `[quote=@<id>]...[/quote]` envelope, or return the text unchanged.
pub fn unwrap_quote(value: &str) -> String {
    match QUOTE_WRAPPER.captures(value).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().to_string(),
        None => value.to_string(),
    }
}

fn with_thread<R>(
    forum: &ForumSlot,
    thread: ThreadRef,
    f: impl FnOnce(&mut ForumThread) -> R,
) -> Option<R> {
    lock_forum(forum).threads.get_mut(thread.0).map(f)
}

struct PostListing<'a> {
    forum: &'a ForumSlot,
    thread: ThreadRef,
    settler: &'a Settler,
}

impl PostListing<'_> {
    /// Quote the `i`-th post (1-based) and read back its markup.
    ///
    /// Leaves the browser on the quote target; the caller restores the listing.
    async fn quote_post(
        &self,
        session: &mut dyn BrowserSession,
        i: usize,
    ) -> Result<(String, String), ScrapeError> {
        session.click(QUOTE_BUTTONS, i - 1).await?;
        self.settler.settle(session).await?;

        let url = session.current_url().await?;
        let raw = match session.value(REPLY_TEXTAREA, 0).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                return Err(ScrapeError::shape(&url, "reply textarea missing after quote"))
            }
            Err(e) => return Err(e.into()),
        };
        session.clear(REPLY_TEXTAREA, 0).await?;

        Ok((unwrap_quote(&raw), url))
    }
}

#[async_trait]
impl PageVisitor for PostListing<'_> {
    async fn visit(&mut self, session: &mut dyn BrowserSession) -> Result<(), ScrapeError> {
        let listing_url = session.current_url().await?;
        let usernames = session.texts(USERNAMES).await?;
        let quotes = session.count(QUOTE_BUTTONS).await?;
        debug!("{} quotable posts on {}", quotes, listing_url);

        for i in 1..=quotes {
            if let Err(e) = session.clear(REPLY_TEXTAREA, 0).await {
                warn!("Skipping post {} on {}: {}", i, listing_url, e);
                continue;
            }

            let (bbcode, url) = self.quote_post(session, i).await?;
            let poster_name = usernames.get(i - 1).cloned().ok_or_else(|| {
                ScrapeError::shape(
                    &listing_url,
                    format!("{} quote buttons but {} usernames", quotes, usernames.len()),
                )
            })?;

            let post = Post {
                url,
                title: None,
                poster_name: Some(poster_name),
                bbcode,
                post_sequence_number: i as u32,
                thread: self.thread,
            };
            with_thread(self.forum, self.thread, |t| t.replies.push(post));

            // The quote click left the listing; restore it before the next glyph lookup.
            session.goto(&listing_url).await?;
            self.settler.settle(session).await?;
        }
        Ok(())
    }
}

/// Fill one thread's opening poster and replies.
///
/// Returns the number of replies the thread holds afterwards.
pub async fn extract_posts(
    session: &mut dyn BrowserSession,
    paginator: &Paginator,
    forum: &ForumSlot,
    thread: ThreadRef,
) -> Result<usize, ScrapeError> {
    let url = with_thread(forum, thread, |t| t.url.clone()).ok_or_else(|| {
        ScrapeError::shape(
            lock_forum(forum).url.clone(),
            format!("no thread at index {}", thread.0),
        )
    })?;

    session.goto(&url).await?;
    paginator.settler().settle(session).await?;

    let opener = session
        .texts(USERNAMES)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::shape(&url, "no usernames on first thread page"))?;
    with_thread(forum, thread, |t| t.poster_name = Some(opener));

    let mut listing = PostListing {
        forum,
        thread,
        settler: paginator.settler(),
    };
    let pages = paginator.walk(session, &mut listing).await?;

    let replies = with_thread(forum, thread, |t| t.replies.len()).unwrap_or_default();
    info!("Captured {} posts over {} pages from {}", replies, pages, url);
    Ok(replies)
}
