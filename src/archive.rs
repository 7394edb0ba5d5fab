//! Write each forum tree to its own JSON document.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::Forum;
use crate::registry::{lock_forum, ForumRegistry};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Forum title '{title}' leaves no usable filename")]
    EmptyFilename { title: String },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File name for a forum: the title with everything outside `[A-Za-z ]` removed.
pub fn archive_filename(title: &str) -> Result<String, ArchiveError> {
    let name: String = title
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .collect();
    if name.trim().is_empty() {
        return Err(ArchiveError::EmptyFilename {
            title: title.to_string(),
        });
    }
    Ok(name)
}

/// Read back an archived forum, restoring post back-references.
pub fn read_forum(path: &Path) -> Result<Forum, ArchiveError> {
    let file = File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut forum: Forum =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ArchiveError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    forum.relink();
    Ok(forum)
}

/// Outcome of writing one forum.
#[derive(Debug)]
pub struct ArchiveEntry {
    pub title: String,
    pub threads: usize,
    pub posts: usize,
    pub result: Result<PathBuf, ArchiveError>,
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveReport {
    pub fn written(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.written()
    }
}

/// Serializes forums into `output_dir`. Clones share one lock, so concurrent
/// archive passes run one after the other.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    output_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ArchiveWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one forum, returning the file path.
    pub fn write_forum(&self, forum: &Forum) -> Result<PathBuf, ArchiveError> {
        let filename = archive_filename(forum.title.as_deref().unwrap_or_default())?;
        let path = self.output_dir.join(filename);

        let io_err = |source| ArchiveError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.output_dir).map_err(io_err)?;

        let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, forum).map_err(|source| ArchiveError::Json {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(io_err)?;

        Ok(path)
    }

    /// Write every forum in the registry. A failed forum never stops the others.
    pub fn write_all(&self, registry: &ForumRegistry) -> ArchiveReport {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut report = ArchiveReport::default();
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();

        for slot in registry.slots() {
            // Snapshot so the slot is not locked during file I/O.
            let forum = lock_forum(slot).clone();
            let title = forum.title.clone().unwrap_or_default();

            let result = self.write_forum(&forum);
            match &result {
                Ok(path) => {
                    if let Some(previous) = claimed.insert(path.clone(), title.clone()) {
                        warn!(
                            "Forum '{}' overwrote '{}' at {}",
                            title,
                            previous,
                            path.display()
                        );
                    }
                    info!(
                        "Wrote forum '{}' ({} threads) to {}",
                        title,
                        forum.threads.len(),
                        path.display()
                    );
                }
                Err(e) => warn!("Failed to archive forum '{}': {}", title, e),
            }

            report.entries.push(ArchiveEntry {
                title,
                threads: forum.threads.len(),
                posts: forum.post_count(),
                result,
            });
        }
        report
    }
}
