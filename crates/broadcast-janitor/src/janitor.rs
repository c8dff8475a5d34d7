//! A single cleaning pass over the session directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use metrics::counter;
use tracing::{debug, info, warn};

/// Files removed (counter).
pub const FILES_DELETED_TOTAL: &str = "janitor_files_deleted_total";
/// Failed removals (counter).
pub const DELETE_FAILURES_TOTAL: &str = "janitor_delete_failures_total";

/// What a pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// The candidate that survived, if there were any.
    pub kept: Option<String>,
    /// Candidates removed.
    pub deleted: Vec<String>,
    /// Candidates that could not be removed.
    pub failed: Vec<String>,
}

/// Keeps the newest session artifact in a directory and deletes the others.
#[derive(Clone, Debug)]
pub struct SessionJanitor {
    dir: PathBuf,
    extension: String,
    protected: HashSet<String>,
}

impl SessionJanitor {
    /// Create a janitor for `dir`.
    ///
    /// Only files whose name ends with `extension` are considered; names in
    /// `protected` are never evaluated or deleted.
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        protected: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory being cleaned.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_candidate(&self, name: &str) -> bool {
        name.ends_with(&self.extension) && !self.protected.contains(name)
    }

    /// Run one pass. Never fails; problems are logged and reflected in the report.
    pub fn clean(&self) -> CleanReport {
        let mut report = CleanReport::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.dir.display(), error = %e, "cannot read session directory");
                return report;
            }
        };

        let mut candidates: Vec<(String, SystemTime)> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %self.dir.display(), error = %e, "cannot read directory entry");
                    continue;
                }
            };
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.is_candidate(&name) {
                continue;
            }
            match fs::metadata(entry.path()).and_then(|m| {
                if m.is_file() {
                    m.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => candidates.push((name, modified)),
                Ok(None) => {}
                Err(e) => {
                    warn!(file = %name, error = %e, "cannot stat session file, skipping");
                }
            }
        }

        let Some(latest) = select_latest(&candidates) else {
            debug!(path = %self.dir.display(), "no session candidates");
            return report;
        };

        for (idx, (name, _)) in candidates.iter().enumerate() {
            if idx == latest {
                continue;
            }
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {
                    counter!(FILES_DELETED_TOTAL).increment(1);
                    report.deleted.push(name.clone());
                }
                Err(e) => {
                    counter!(DELETE_FAILURES_TOTAL).increment(1);
                    warn!(file = %name, error = %e, "failed to delete session file");
                    report.failed.push(name.clone());
                }
            }
        }
        report.kept = Some(candidates[latest].0.clone());

        info!(
            kept = report.kept.as_deref().unwrap_or_default(),
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "session janitor pass complete"
        );
        report
    }
}

/// Index of the most recently modified entry.
///
/// Ties keep the first one encountered, so the result follows listing order.
pub fn select_latest<N>(candidates: &[(N, SystemTime)]) -> Option<usize> {
    let mut iter = candidates.iter().enumerate();
    let (mut best, first) = iter.next()?;
    let mut best_time = first.1;
    for (idx, (_, time)) in iter {
        if *time > best_time {
            best = idx;
            best_time = *time;
        }
    }
    Some(best)
}
