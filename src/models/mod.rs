//! Data models for forumvac.

mod forum;

pub use forum::{Forum, ForumHandle, ForumThread, Post, ThreadRef};
