//! Forum scraping engine.
//!
//! Leaves first: [`Settler`] waits out page loads, [`login`] authenticates a
//! session, [`gather_base_forums`] reads the forum index, [`Paginator`] walks
//! "next page" listings, [`harvest_threads`] and [`extract_posts`] fill a
//! forum slot, and [`ScrapeWorker`] composes them for one top-level forum.

mod auth;
mod gather;
mod paginate;
mod posts;
pub mod selectors;
mod settle;
mod threads;
mod worker;

pub use auth::login;
pub use gather::gather_base_forums;
pub use paginate::{PageVisitor, Paginator};
pub use posts::{extract_posts, unwrap_quote};
pub use settle::Settler;
pub use threads::harvest_threads;
pub use worker::ScrapeWorker;

use std::time::Duration;

use thiserror::Error;

use crate::browser::DriverError;

/// Failure while scraping a page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Page did not reach ready state within {}s: {url}", .waited.as_secs())]
    PageLoadTimeout { url: String, waited: Duration },
    #[error("Login form element missing: {0}")]
    AuthUiMissing(&'static str),
    #[error("Unexpected page shape at {url}: {detail}")]
    PageShapeMismatch { url: String, detail: String },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ScrapeError {
    pub fn shape(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PageShapeMismatch {
            url: url.into(),
            detail: detail.into(),
        }
    }
}
