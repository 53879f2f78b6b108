//! Debounced reload watcher: runs a command whose lines announce that the
//! underlying source changed, and fires a pager's reload after a short quiet
//! period so a burst of change notifications collapses into one reload.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::time::Duration;

use rat_proc::ProcessHandle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a command's output and calls `on_fire` at most once per debounce
/// window after the command produces a line.
pub struct ReloadWatcher {
    process: ProcessHandle,
    debounce_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ReloadWatcher {
    /// Starts `cmd` (via `$SHELL -c`, in its own process group) and begins
    /// watching its merged output. `on_fire` runs on the current Tokio
    /// runtime each time the debounce window elapses with no further lines.
    pub fn start<F>(cmd: &str, ctx: &HashMap<String, String>, on_fire: F) -> Result<Self, rat_proc::ProcError>
    where
        F: Fn() + Send + 'static,
    {
        let (process, reader) = rat_proc::exec(cmd, ctx)?;
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<()>();

        let reader_task = tokio::task::spawn_blocking(move || {
            let mut lines = BufReader::new(reader).lines();
            while let Some(Ok(line)) = lines.next() {
                debug!(%line, "reload watcher saw a line");
                if line_tx.send(()).is_err() {
                    break;
                }
            }
        });

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let debounce_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = line_rx.recv() => {
                        if received.is_none() {
                            return;
                        }
                    }
                    _ = &mut stop_rx => return,
                }

                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(DEBOUNCE) => {
                            on_fire();
                            break;
                        }
                        more = line_rx.recv() => {
                            if more.is_none() {
                                return;
                            }
                        }
                        _ = &mut stop_rx => return,
                    }
                }
            }
        });

        Ok(Self {
            process,
            debounce_task,
            reader_task,
            stop_tx: Some(stop_tx),
        })
    }

    /// Stops watching: signals the debounce loop to exit and kills the
    /// watcher command's process group.
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(err) = self.process.kill() {
            warn!(%err, "failed to kill reload watcher process");
        }
        self.reader_task.abort();
        self.debounce_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_once_after_a_burst_of_lines() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let watcher = ReloadWatcher::start(
            "for i in 1 2 3; do echo $i; sleep 0.05; done",
            &HashMap::new(),
            move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        watcher.stop();
    }

    #[tokio::test]
    async fn stop_prevents_further_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let watcher = ReloadWatcher::start("echo one; sleep 10", &HashMap::new(), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher.stop();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
