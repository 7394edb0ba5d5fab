//! Browser engine configuration types.
//!
//! Kept outside the `browser` module so the CLI builds without the `browser`
//! feature.

/// DevTools request timeout used unless overridden, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run without a visible window (default: false).
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    pub proxy: Option<String>,

    /// DevTools request timeout in seconds.
    pub timeout: u64,

    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    pub remote_url: Option<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: false,
            proxy: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `SOCKS_PROXY` - Proxy for browser traffic (e.g., "socks5://127.0.0.1:9050")
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            let val = val.trim();
            if !val.is_empty() {
                self.remote_url = Some(val.to_string());
            }
        }
        if let Ok(val) = std::env::var("SOCKS_PROXY") {
            if !val.is_empty() {
                self.proxy = Some(val);
            }
        }
        self
    }
}
