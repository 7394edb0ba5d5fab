//! Run one scrape worker per top-level forum over a bounded pool.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::archive::{ArchiveReport, ArchiveWriter};
use crate::browser::{BrowserSession, SessionFactory};
use crate::config::ScrapeConfig;
use crate::models::ForumHandle;
use crate::registry::ForumRegistry;
use crate::scrape::{gather_base_forums, login, Paginator, ScrapeError, ScrapeWorker};
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every worker finished.
    Completed,
    /// A worker failed; peers were abandoned.
    Failed,
    /// The operator asked to stop.
    Quit,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed | Self::Quit => 0,
            Self::Failed => 1,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub report: ArchiveReport,
}

pub struct Dispatcher {
    config: ScrapeConfig,
    factory: Arc<dyn SessionFactory>,
    shutdown: ShutdownSignal,
}

impl Dispatcher {
    pub fn new(
        config: ScrapeConfig,
        factory: Arc<dyn SessionFactory>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            config,
            factory,
            shutdown,
        }
    }

    /// Gather the forums, scrape them all, and write the archive.
    ///
    /// The archive is written on every path that gets past the forum index,
    /// including worker failure and operator quit. A quit before the index is
    /// read ends the run at once with nothing archived.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let paginator = Paginator::new(&self.config.timing);

        let Some(mut handles) = self
            .bootstrap(&paginator)
            .await
            .context("Failed to read the forum index")?
        else {
            let outcome = match self.shutdown.current() {
                ShutdownReason::Failed => RunOutcome::Failed,
                _ => RunOutcome::Quit,
            };
            info!("Stopped before any forum was scraped");
            return Ok(RunSummary {
                outcome,
                report: ArchiveReport::default(),
            });
        };

        let filter = &self.config.forum_filter;
        if !filter.is_empty() {
            let found = handles.len();
            handles.retain(|h| filter.allows(h));
            info!("Forum filter kept {} of {} forums", handles.len(), found);
        }

        let registry = Arc::new(ForumRegistry::new(handles));
        let writer = ArchiveWriter::new(&self.config.output_dir);

        let worker = ScrapeWorker {
            factory: self.factory.clone(),
            site: self.config.site.clone(),
            credentials: self.config.credentials.clone(),
            paginator,
            registry: registry.clone(),
            writer: writer.clone(),
            shutdown: self.shutdown.clone(),
        };

        let mut outcome = self.run_workers(worker, &registry).await;
        if outcome == RunOutcome::Completed && !registry.terminated_normally() {
            outcome = RunOutcome::Failed;
        }

        let report = writer.write_all(&registry);
        info!(
            "Archived {} of {} forums to {}",
            report.written(),
            report.entries.len(),
            writer.output_dir().display()
        );

        Ok(RunSummary { outcome, report })
    }

    /// Log in on a throwaway session and read the forum index.
    ///
    /// Returns `None` if shutdown is requested first.
    async fn bootstrap(
        &self,
        paginator: &Paginator,
    ) -> Result<Option<Vec<ForumHandle>>, ScrapeError> {
        let mut session = tokio::select! {
            biased;
            _ = self.shutdown.requested() => return Ok(None),
            session = self.factory.open() => session?,
        };

        let result = tokio::select! {
            biased;
            _ = self.shutdown.requested() => Ok(None),
            handles = self.read_index(session.as_mut(), paginator) => handles.map(Some),
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close bootstrap browser: {}", e);
        }
        result
    }

    async fn read_index(
        &self,
        session: &mut dyn BrowserSession,
        paginator: &Paginator,
    ) -> Result<Vec<ForumHandle>, ScrapeError> {
        let site = &self.config.site;
        login(session, paginator.settler(), site, &self.config.credentials).await?;
        gather_base_forums(session, paginator.settler(), site).await
    }

    async fn run_workers(&self, worker: ScrapeWorker, registry: &ForumRegistry) -> RunOutcome {
        let permits = self
            .config
            .concurrency
            .permits()
            .map(|n| Arc::new(Semaphore::new(n)));

        info!(
            "Scraping {} forums with {} browser(s)",
            registry.len(),
            self.config.concurrency
        );

        let mut workers = JoinSet::new();
        for index in 0..registry.len() {
            let worker = worker.clone();
            let permits = permits.clone();
            workers.spawn(async move {
                let _permit = match permits {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                worker.run(index).await
            });
        }

        let outcome = tokio::select! {
            drained = tokio::time::timeout(
                self.config.timing.await_limit,
                drain(&mut workers, registry),
            ) => match drained {
                Ok(true) => RunOutcome::Completed,
                Ok(false) => RunOutcome::Failed,
                Err(_) => {
                    error!("Workers still running after {:?}", self.config.timing.await_limit);
                    registry.mark_abnormal();
                    RunOutcome::Failed
                }
            },
            reason = self.shutdown.requested() => match reason {
                ShutdownReason::Quit => RunOutcome::Quit,
                _ => RunOutcome::Failed,
            },
        };

        if !workers.is_empty() {
            warn!("Stopping {} unfinished workers", workers.len());
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }
        outcome
    }
}

/// Await every worker. Returns false if any failed or panicked.
async fn drain(
    workers: &mut JoinSet<Result<(), ScrapeError>>,
    registry: &ForumRegistry,
) -> bool {
    let mut clean = true;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(_)) => clean = false,
            Err(e) => {
                error!("Worker task died: {}", e);
                registry.mark_abnormal();
                clean = false;
            }
        }
    }
    clean
}
