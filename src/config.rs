//! Run configuration: target site, credentials, timing, and pool sizing.

mod browser;

pub use browser::BrowserEngineConfig;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::models::ForumHandle;

/// Everything one archive run needs.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub site: SiteConfig,
    pub credentials: Credentials,
    pub timing: Timing,
    pub concurrency: Concurrency,
    /// Directory the per-forum archive files are written into.
    pub output_dir: PathBuf,
    pub browser: BrowserEngineConfig,
    /// Restricts which gathered forums get scraped. Empty means all.
    pub forum_filter: ForumFilter,
}

/// Location of the forum site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    base_url: String,
    forum_path: String,
}

impl SiteConfig {
    /// Validate `base_url` (scheme + host) and keep `forum_path` verbatim.
    pub fn new(base_url: &str, forum_path: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            forum_path: forum_path.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    /// Root page listing the top-level forums.
    pub fn forum_root(&self) -> String {
        format!("{}{}", self.base_url, self.forum_path)
    }
}

/// Login credentials.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Waits and ceilings used while driving the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Ceiling for `document.readyState` to reach "complete".
    pub ready_timeout: Duration,
    /// Quiescence pause after the ready state is reached.
    pub settle_pause: Duration,
    /// How long to look for the next-page control before ending a listing.
    pub next_page_wait: Duration,
    /// Interval between DOM polls while waiting.
    pub poll_interval: Duration,
    /// Upper bound on the dispatcher's wait for all workers.
    pub await_limit: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(30),
            settle_pause: Duration::from_millis(1500),
            next_page_wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            await_limit: Duration::from_secs(20 * 24 * 60 * 60),
        }
    }
}

/// How many forum workers may run at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// One worker at a time.
    #[default]
    Single,
    /// Fixed pool of `n` workers (n >= 2).
    Fixed(usize),
    /// Every forum gets a worker immediately.
    Unbounded,
}

impl Concurrency {
    /// Map a browser count onto a pool shape.
    pub fn from_count(count: usize) -> Result<Self, ConfigError> {
        match count {
            0 => Err(ConfigError::InvalidConcurrency("0".to_string())),
            1 => Ok(Self::Single),
            usize::MAX => Ok(Self::Unbounded),
            n => Ok(Self::Fixed(n)),
        }
    }

    /// Permit count for the worker semaphore, `None` when unbounded.
    pub fn permits(&self) -> Option<usize> {
        match self {
            Self::Single => Some(1),
            Self::Fixed(n) => Some(*n),
            Self::Unbounded => None,
        }
    }
}

impl FromStr for Concurrency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "unbounded" | "unlimited" => Ok(Self::Unbounded),
            other => other
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidConcurrency(s.to_string()))
                .and_then(Self::from_count),
        }
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "1"),
            Self::Fixed(n) => write!(f, "{}", n),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Selection of forums to archive, by title or URL.
///
/// An entry matches a forum whose trimmed title equals it, whose URL equals
/// it, or whose last URL path segment equals it (a bare forum id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumFilter {
    entries: Vec<String>,
}

impl ForumFilter {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn allows(&self, forum: &ForumHandle) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let title = forum.title.trim();
        let last_segment = Url::parse(&forum.url).ok().and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.rfind(|s| !s.is_empty()).map(str::to_string))
        });

        self.entries.iter().any(|entry| {
            entry == title
                || *entry == forum.url
                || last_segment.as_deref() == Some(entry.as_str())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Invalid browser count '{0}'. Use a positive integer or 'unbounded'")]
    InvalidConcurrency(String),
}
