//! Periodic janitor passes with an explicit start/stop lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::janitor::SessionJanitor;

/// A running janitor loop.
///
/// Stops when [`stop`](Self::stop) is called or the token it was spawned with
/// is cancelled (typically the process shutdown token).
pub struct JanitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl JanitorTask {
    /// Start running passes every `interval`.
    ///
    /// With `run_on_start` the first pass happens immediately; otherwise after
    /// one full interval. Each pass runs on the blocking pool.
    pub fn spawn(
        janitor: Arc<SessionJanitor>,
        interval: Duration,
        run_on_start: bool,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let first = if run_on_start {
                Instant::now()
            } else {
                Instant::now() + interval
            };
            let mut ticker = time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                path = %janitor.dir().display(),
                interval_secs = interval.as_secs(),
                "session janitor started"
            );

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let pass = Arc::clone(&janitor);
                        if let Err(e) = tokio::task::spawn_blocking(move || pass.clean()).await {
                            warn!(error = %e, "session janitor pass panicked");
                        }
                    }
                }
            }
            info!("session janitor stopped");
        });

        Self { cancel, handle }
    }

    /// Ask the loop to stop after any in-progress pass.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }

    /// Hand the join handle to a shutdown coordinator.
    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::SystemTime;

    const WAIT: Duration = Duration::from_secs(5);

    fn write_with_mtime(dir: &Path, name: &str, secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, b"{}").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs))
            .unwrap();
    }

    async fn wait_for_removal(path: &Path) -> bool {
        let deadline = std::time::Instant::now() + WAIT;
        while std::time::Instant::now() < deadline {
            if !path.exists() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn janitor(dir: &Path) -> Arc<SessionJanitor> {
        Arc::new(SessionJanitor::new(dir, ".json", ["creds.json"]))
    }

    #[tokio::test]
    async fn run_on_start_cleans_immediately() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(dir.path(), "old.json", 1);
        write_with_mtime(dir.path(), "new.json", 2);

        let task = JanitorTask::spawn(
            janitor(dir.path()),
            Duration::from_secs(3600),
            true,
            CancellationToken::new(),
        );

        assert!(wait_for_removal(&dir.path().join("old.json")).await);
        assert!(dir.path().join("new.json").exists());
        task.shutdown().await;
    }

    #[tokio::test]
    async fn periodic_pass_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(dir.path(), "a.json", 1);

        let task = JanitorTask::spawn(
            janitor(dir.path()),
            Duration::from_millis(20),
            false,
            CancellationToken::new(),
        );

        write_with_mtime(dir.path(), "b.json", 2);
        assert!(wait_for_removal(&dir.path().join("a.json")).await);
        task.shutdown().await;
    }

    #[tokio::test]
    async fn stop_ends_loop() {
        let dir = tempfile::tempdir().unwrap();
        let task = JanitorTask::spawn(
            janitor(dir.path()),
            Duration::from_secs(3600),
            false,
            CancellationToken::new(),
        );
        assert!(!task.is_finished());

        tokio::time::timeout(WAIT, task.shutdown()).await.unwrap();
    }

    #[tokio::test]
    async fn parent_token_stops_loop() {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = CancellationToken::new();
        let task = JanitorTask::spawn(
            janitor(dir.path()),
            Duration::from_secs(3600),
            false,
            shutdown.clone(),
        );

        shutdown.cancel();
        tokio::time::timeout(WAIT, task.into_handle())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn missing_directory_does_not_kill_loop() {
        let dir = tempfile::tempdir().unwrap();
        let task = JanitorTask::spawn(
            janitor(&dir.path().join("missing")),
            Duration::from_millis(10),
            true,
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        task.shutdown().await;
    }
}
