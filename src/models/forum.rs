//! Forum archive entities.
//!
//! A `Forum` owns its `ForumThread`s, which own their `Post`s. The archive
//! format is the serde rendition of this tree: `camelCase` keys, `None`
//! fields omitted, and the post → thread back-reference left out.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Serializes diagnostic renders so concurrent `Display` calls do not interleave.
static RENDER_LOCK: Mutex<()> = Mutex::new(());

/// Top-level forum handle as read from the forum index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumHandle {
    pub url: String,
    pub title: String,
}

/// Non-owning reference from a post to the thread that owns it.
///
/// Holds the thread's position inside its forum's `threads` list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ThreadRef(pub usize);

/// A top-level board and every thread scraped from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub threads: Vec<ForumThread>,
}

impl Forum {
    /// Create an empty forum from an index handle.
    pub fn from_handle(handle: ForumHandle) -> Self {
        Self {
            url: handle.url,
            title: Some(handle.title),
            threads: Vec::new(),
        }
    }

    pub fn post_count(&self) -> usize {
        self.threads.iter().map(|t| t.replies.len()).sum()
    }

    /// Rebuild every post's back-reference from tree position.
    ///
    /// Needed after deserializing, since the reference is never written out.
    pub fn relink(&mut self) {
        for (idx, thread) in self.threads.iter_mut().enumerate() {
            for post in &mut thread.replies {
                post.thread = ThreadRef(idx);
            }
        }
    }

    /// Resolve a post's back-reference.
    pub fn thread_of(&self, post: &Post) -> Option<&ForumThread> {
        self.threads.get(post.thread.0)
    }
}

/// One discussion inside a forum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumThread {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_title: Option<String>,
    /// Opening poster, taken from the first username on the first page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_name: Option<String>,
    #[serde(default)]
    pub replies: Vec<Post>,
}

impl ForumThread {
    pub fn new(url: impl Into<String>, thread_title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            thread_title: Some(thread_title.into()),
            poster_name: None,
            replies: Vec::new(),
        }
    }
}

/// A single post, recovered as source markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Page URL right after the quote click.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_name: Option<String>,
    pub bbcode: String,
    /// 1-based position on the page the post was scraped from.
    pub post_sequence_number: u32,
    #[serde(skip)]
    pub thread: ThreadRef,
}

fn render<T: Serialize>(kind: &str, value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let _guard = RENDER_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let body = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
    write!(f, "========{kind}========\n{body}\n================")
}

impl fmt::Display for Forum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render("Forum", self, f)
    }
}

impl fmt::Display for ForumThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render("ForumThread", self, f)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render("Post", self, f)
    }
}
