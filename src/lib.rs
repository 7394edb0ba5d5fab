//! forumvac - archive a bulletin-board forum through a driven browser.
//!
//! Logs in, walks every top-level forum, its threads and their posts, and
//! writes one JSON document per forum. Post bodies are recovered as BBCode
//! through the site's own quote-reply editor.

pub mod archive;
pub mod browser;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod interactive;
pub mod models;
pub mod registry;
pub mod scrape;
pub mod shutdown;
