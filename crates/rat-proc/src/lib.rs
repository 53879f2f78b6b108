//! Subprocess reader: a streaming `$SHELL -c <cmd>` reader with its own
//! process group, so [`ProcessHandle::kill`] can take down the whole tree.
//! Every spawned command goes through this same process-group-kill machinery,
//! not just the reload watcher that originally needed it.

use std::collections::HashMap;
use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("failed to spawn `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to signal process group {pgid}: {source}")]
    Kill { pgid: i32, source: nix::Error },
}

/// The merged stdout+stderr stream of a spawned command.
///
/// Draining stdout fully before stderr (e.g. via `Read::chain`) risks a deadlock:
/// a command that writes heavily to stderr before closing stdout blocks on a full
/// stderr pipe buffer while nobody is reading it yet. Instead, two background
/// threads each copy one stream into a shared channel as chunks arrive, so both
/// pipes are always being drained; `Read` pulls whichever chunk turns up first.
/// Interleaving between the two streams is therefore not ordered relative to each
/// other, only within each stream.
pub struct MergedOutput {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
}

impl MergedOutput {
    fn spawn(stdout: std::process::ChildStdout, stderr: std::process::ChildStderr) -> Self {
        let (tx, rx) = mpsc::channel();

        let out_tx = tx.clone();
        thread::spawn(move || drain(stdout, out_tx));
        thread::spawn(move || drain(stderr, tx));

        Self {
            rx,
            pending: Vec::new(),
        }
    }
}

/// Copies `src` into `tx` in fixed-size chunks until EOF or a read error, then
/// drops `tx`; once both stream threads have dropped their sender, `rx` reports
/// the stream as closed.
fn drain<R: Read>(mut src: R, tx: mpsc::Sender<io::Result<Vec<u8>>>) {
    let mut buf = [0u8; 8192];
    loop {
        match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                break;
            }
        }
    }
}

impl Read for MergedOutput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => self.pending = chunk,
                Ok(Err(err)) => return Err(err),
                Err(_) => return Ok(0), // both streams closed
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

fn shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
}

/// A handle to a running subprocess placed in its own process group. The process
/// is always reaped in the background; `kill` signals the whole group.
pub struct ProcessHandle {
    pgid: Pid,
}

impl ProcessHandle {
    /// Sends `SIGTERM` to the negated process-group id, killing the command and
    /// every descendant it spawned. Idempotent: a process group that has already
    /// exited is not an error.
    pub fn kill(&self) -> Result<(), ProcError> {
        match killpg(self.pgid, Signal::SIGTERM) {
            Ok(()) | Err(nix::Error::ESRCH) => Ok(()),
            Err(source) => Err(ProcError::Kill {
                pgid: self.pgid.as_raw(),
                source,
            }),
        }
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }
}

fn build_command(cmd: &str, ctx: &HashMap<String, String>) -> Command {
    let mut command = Command::new(shell());
    command.arg("-c").arg(cmd);
    command.envs(ctx);
    // New process group led by the child itself, so a kill targets the whole tree.
    command.process_group(0);
    command
}

/// Spawns `$SHELL -c <cmd>` in its own process group with `ctx` merged into its
/// environment, returning a handle (for `kill`) and a reader over its merged
/// stdout+stderr. The child is reaped on a background task to avoid zombies.
pub fn exec(cmd: &str, ctx: &HashMap<String, String>) -> Result<(ProcessHandle, MergedOutput), ProcError> {
    let mut command = build_command(cmd, ctx);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| ProcError::Spawn {
        cmd: cmd.to_string(),
        source,
    })?;

    let pgid = Pid::from_raw(child.id() as i32);
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    tokio::task::spawn_blocking(move || match child.wait() {
        Ok(status) => debug!(?status, "reaped subprocess"),
        Err(err) => warn!(%err, "failed to reap subprocess"),
    });

    Ok((ProcessHandle { pgid }, MergedOutput::spawn(stdout, stderr)))
}

/// Runs `$SHELL -c <cmd>` in the foreground with inherited stdio, blocking until it
/// exits. Used by `!<cmd>` bindings, which the caller brackets with the terminal
/// backend's `leave()`/`enter()`.
pub fn run_foreground(cmd: &str, ctx: &HashMap<String, String>) -> Result<ExitStatus, ProcError> {
    let mut command = build_command(cmd, ctx);
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    command.status().map_err(|source| ProcError::Spawn {
        cmd: cmd.to_string(),
        source,
    })
}

/// Whether an [`ExitStatus`] represents the process being killed by a signal
/// (as opposed to exiting normally), used by callers distinguishing a clean exit
/// from a reload-triggered kill.
pub fn killed_by_signal(status: ExitStatus) -> bool {
    status.signal().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exec_merges_stdout_and_stderr() {
        // Both streams are drained concurrently, so only per-stream ordering is
        // guaranteed, not interleaving order between the two.
        let ctx = HashMap::new();
        let (handle, mut reader) = exec("echo out; echo err >&2", &ctx).unwrap();
        let mut out = String::new();
        std::io::Read::read_to_string(&mut reader, &mut out).unwrap();
        assert!(out.contains("out\n"));
        assert!(out.contains("err\n"));
        drop(handle);
    }

    #[tokio::test]
    async fn exec_does_not_deadlock_on_heavy_stderr_before_stdout_close() {
        // A command that writes a lot to stderr, then closes stdout only after
        // that, would deadlock a stdout-then-stderr `Chain` once the stderr pipe
        // buffer filled up and the child blocked writing to it while nobody was
        // reading. Concurrent draining must let it finish.
        let ctx = HashMap::new();
        let cmd = "for i in $(seq 1 5000); do echo line$i >&2; done; echo done";
        let (handle, mut reader) = exec(cmd, &ctx).unwrap();
        let mut out = String::new();
        std::io::Read::read_to_string(&mut reader, &mut out).unwrap();
        assert!(out.contains("done\n"));
        assert!(out.contains("line5000\n"));
        drop(handle);
    }

    #[tokio::test]
    async fn exec_honours_context_environment() {
        let mut ctx = HashMap::new();
        ctx.insert("RAT_TEST_VAR".to_string(), "hello".to_string());
        let (_handle, mut reader) = exec("echo $RAT_TEST_VAR", &ctx).unwrap();
        let mut out = String::new();
        std::io::Read::read_to_string(&mut reader, &mut out).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn kill_terminates_process_group() {
        let ctx = HashMap::new();
        let (handle, mut reader) = exec("sleep 30", &ctx).unwrap();
        handle.kill().unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn kill_on_already_exited_process_is_not_an_error() {
        let ctx = HashMap::new();
        let (handle, mut reader) = exec("true", &ctx).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut out).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.kill().unwrap();
    }
}
