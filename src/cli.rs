//! Command-line entry point.

use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;

use crate::archive::ArchiveReport;
use crate::browser::SessionFactory;
use crate::config::{
    BrowserEngineConfig, Concurrency, Credentials, ForumFilter, ScrapeConfig, SiteConfig,
    Timing,
};
use crate::dispatch::{Dispatcher, RunOutcome, RunSummary};
use crate::interactive::{spawn_interrupt_listener, spawn_quit_listener};
use crate::shutdown::ShutdownSignal;

#[derive(Parser, Debug)]
#[command(name = "forumvac")]
#[command(about = "Archive every forum, thread and post of a bulletin board")]
#[command(version)]
pub struct Cli {
    /// Site root, e.g. https://forum.example.com
    #[arg(long = "baseurl", env = "baseurl")]
    pub base_url: String,

    /// Path of the forum index, appended to the base URL
    #[arg(long = "forum", env = "forum", default_value = "")]
    pub forum_path: String,

    #[arg(long, env = "username")]
    pub username: String,

    #[arg(long, env = "password", hide_env_values = true)]
    pub password: String,

    /// Run browsers without a window
    #[arg(long, env = "headless")]
    pub headless: bool,

    /// Concurrent browsers: a positive integer or "unbounded"
    #[arg(long, env = "numBrowsers", default_value = "1")]
    pub num_browsers: Concurrency,

    /// Pause after each page load, in milliseconds
    #[arg(long, env = "settleMs", default_value_t = 1500)]
    pub settle_ms: u64,

    /// Directory for the per-forum archive files
    #[arg(long, env = "outputDir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Connect to a running browser's DevTools endpoint instead of launching one
    #[arg(long, env = "BROWSER_URL")]
    pub browser_url: Option<String>,

    /// Only archive these forums (comma-separated titles, URLs or forum ids)
    #[arg(long = "forum-filter", env = "forumIds", value_delimiter = ',')]
    pub forum_filter: Vec<String>,

    /// Also write log output to this file
    #[arg(long, env = "logFile")]
    pub log_file: Option<PathBuf>,

    /// Extra Chrome argument (repeatable)
    #[arg(long = "chrome-arg", allow_hyphen_values = true)]
    pub chrome_args: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Log file path, for early logging setup: `--log-file` wins over `logFile`.
pub fn log_file() -> Option<PathBuf> {
    log_file_from(std::env::args(), std::env::var("logFile").ok())
}

fn log_file_from<I>(args: I, env: Option<String>) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--log-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--log-file=") {
            return Some(PathBuf::from(path));
        }
    }
    env.filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<ScrapeConfig> {
        let site = SiteConfig::new(&self.base_url, &self.forum_path)?;

        let mut browser = BrowserEngineConfig::default().with_env_overrides();
        browser.headless = self.headless;
        browser.chrome_args = self.chrome_args;
        if self.browser_url.is_some() {
            browser.remote_url = self.browser_url;
        }

        Ok(ScrapeConfig {
            site,
            credentials: Credentials {
                username: self.username,
                password: self.password,
            },
            timing: Timing {
                settle_pause: Duration::from_millis(self.settle_ms),
                ..Timing::default()
            },
            concurrency: self.num_browsers,
            output_dir: self.output_dir,
            browser,
            forum_filter: ForumFilter::new(&self.forum_filter),
        })
    }
}

pub async fn run() -> anyhow::Result<ExitCode> {
    let config = Cli::parse().into_config()?;
    let factory = session_factory(&config.browser)?;

    let shutdown = ShutdownSignal::new();
    println!("Type 'q' and <enter> to exit the script.");
    spawn_quit_listener(BufReader::new(std::io::stdin()), shutdown.clone())?;
    let interrupt = spawn_interrupt_listener(shutdown.clone());

    let summary = Dispatcher::new(config, factory, shutdown).run().await;
    interrupt.abort();
    let summary = summary?;

    print_summary(&summary);
    Ok(ExitCode::from(summary.outcome.exit_code()))
}

#[cfg(feature = "browser")]
fn session_factory(config: &BrowserEngineConfig) -> anyhow::Result<Arc<dyn SessionFactory>> {
    Ok(Arc::new(crate::browser::ChromeSessionFactory::new(
        config.clone(),
    )))
}

#[cfg(not(feature = "browser"))]
fn session_factory(_config: &BrowserEngineConfig) -> anyhow::Result<Arc<dyn SessionFactory>> {
    anyhow::bail!("forumvac was built without the 'browser' feature")
}

fn print_summary(summary: &RunSummary) {
    print_report(&summary.report);

    let status = match summary.outcome {
        RunOutcome::Completed => style("completed").green(),
        RunOutcome::Quit => style("stopped by operator").yellow(),
        RunOutcome::Failed => style("failed").red(),
    };
    println!("\nRun {}", status.bold());
}

fn print_report(report: &ArchiveReport) {
    for entry in &report.entries {
        match &entry.result {
            Ok(path) => println!(
                "  {} {} ({} threads, {} posts) -> {}",
                style("✓").green(),
                style(&entry.title).cyan(),
                entry.threads,
                entry.posts,
                path.display()
            ),
            Err(e) => println!(
                "  {} {} ({} threads, {} posts): {}",
                style("✗").red(),
                style(&entry.title).cyan(),
                entry.threads,
                entry.posts,
                e
            ),
        }
    }
}
