//! Oracle backed by the TypeScript compiler in watch mode.
//!
//! Each session copies the baseline configuration to a temporary file next
//! to it, starts `tsc -p <copy> --watch --noEmit`, and rewrites the copy for
//! every submission. The compiler prints a completion line after each
//! rebuild; its error count is the verdict.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use ratchet_storage::{include_unit, InclusionMode, StorageError, TsConfigDocument};
use tempfile::NamedTempFile;

use super::{CompletionSignal, Oracle, OracleConfig, OracleSession, Verdict};
use crate::error::{OracleError, OracleFailure};

#[derive(Debug)]
enum OutputEvent {
    Line(String),
    Closed,
}

/// Starts [`TscSession`]s for one configuration file.
#[derive(Debug)]
pub struct TscOracle {
    config_path: PathBuf,
    root: PathBuf,
    options: OracleConfig,
    signal: CompletionSignal,
}

impl TscOracle {
    pub fn new(config_path: &Path, options: OracleConfig) -> Result<Self, OracleError> {
        let config_path = fs::canonicalize(config_path).map_err(|source| OracleError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(TscOracle {
            config_path,
            root,
            options,
            signal: CompletionSignal::new()?,
        })
    }

    pub fn options(&self) -> &OracleConfig {
        &self.options
    }

    fn program(&self) -> PathBuf {
        let program = &self.options.program;
        if program.is_relative() && program.components().count() > 1 {
            self.root.join(program)
        } else {
            program.clone()
        }
    }
}

impl Oracle for TscOracle {
    type Session = TscSession;

    fn acquire(&mut self) -> Result<TscSession, OracleError> {
        let baseline = TsConfigDocument::load(&self.config_path)?;

        let copy = tempfile::Builder::new()
            .prefix(".ratchet-")
            .suffix(".json")
            .tempfile_in(&self.root)
            .map_err(|source| OracleError::Io {
                path: self.root.clone(),
                source,
            })?;
        baseline.write_atomic(copy.path())?;

        let program = self.program();
        let mut child = Command::new(&program)
            .args(&self.options.program_args)
            .arg("-p")
            .arg(copy.path())
            .args(&self.options.watch_args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: program.clone(),
                source,
            })?;
        tracing::debug!(program = %program.display(), copy = %copy.path().display(), "checker started");

        let (tx, events) = crossbeam_channel::unbounded();
        let mut open_streams = 0;
        if let Some(stdout) = child.stdout.take() {
            pump(stdout, tx.clone());
            open_streams += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            pump(stderr, tx);
            open_streams += 1;
        }

        let mut session = TscSession {
            child,
            copy: Some(copy),
            baseline,
            root: self.root.clone(),
            mode: self.options.mode,
            submit_timeout: self.options.submit_timeout,
            signal: self.signal.clone(),
            events,
            open_streams,
            failure: None,
        };

        let baseline_errors = session
            .await_signal(self.options.startup_timeout)
            .map_err(OracleError::Startup)?;
        tracing::info!(errors = baseline_errors, "checker ready");
        Ok(session)
    }
}

/// Forwards each line of `stream` to `tx` from a background thread.
fn pump<R: Read + Send + 'static>(stream: R, tx: Sender<OutputEvent>) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if tx.send(OutputEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(OutputEvent::Closed);
    });
}

/// A running `tsc --watch` process and its scoped configuration copy.
#[derive(Debug)]
pub struct TscSession {
    child: Child,
    copy: Option<NamedTempFile>,
    baseline: TsConfigDocument,
    root: PathBuf,
    mode: InclusionMode,
    submit_timeout: Duration,
    signal: CompletionSignal,
    events: Receiver<OutputEvent>,
    open_streams: usize,
    /// Set once the session has failed; later submissions are refused.
    failure: Option<OracleFailure>,
}

impl TscSession {
    /// Path of the scoped configuration copy, while the session holds it.
    pub fn copy_path(&self) -> Option<&Path> {
        self.copy.as_ref().map(|copy| copy.path())
    }

    /// The baseline with every unit of `units` included, exactly as a
    /// commit would include it.
    fn candidate(&self, units: &[&Path]) -> Result<TsConfigDocument, StorageError> {
        let mut doc = self.baseline.clone();
        for unit in units {
            include_unit(&mut doc, &self.root, unit, self.mode)?;
        }
        Ok(doc)
    }

    fn await_signal(&mut self, timeout: Duration) -> Result<u32, OracleFailure> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(OutputEvent::Line(line)) => {
                    tracing::debug!(target: "ratchet::tsc", "{line}");
                    if let Some(count) = self.signal.parse(&line) {
                        return Ok(count);
                    }
                }
                Ok(OutputEvent::Closed) => {
                    self.open_streams = self.open_streams.saturating_sub(1);
                    if self.open_streams == 0 {
                        return Err(self.exited());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(OracleFailure::TimedOut { after: timeout })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(self.exited()),
            }
        }
    }

    /// Discards output that arrived before the next submission.
    fn drain(&mut self) -> Result<(), OracleFailure> {
        loop {
            match self.events.try_recv() {
                Ok(OutputEvent::Line(line)) => {
                    tracing::debug!(target: "ratchet::tsc", "discarding stale output: {line}");
                }
                Ok(OutputEvent::Closed) => {
                    self.open_streams = self.open_streams.saturating_sub(1);
                    if self.open_streams == 0 {
                        return Err(self.exited());
                    }
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(self.exited()),
            }
        }
    }

    fn exited(&mut self) -> OracleFailure {
        let code = self
            .child
            .try_wait()
            .ok()
            .flatten()
            .and_then(|status| status.code());
        OracleFailure::Exited { code }
    }

    fn fail(&mut self, failure: OracleFailure) -> Verdict {
        self.failure = Some(failure.clone());
        Verdict::Failed(failure)
    }

    fn terminate(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            if let Err(err) = self.child.kill() {
                tracing::warn!(error = %err, "failed to kill checker");
            }
        }
        let _ = self.child.wait();
    }
}

impl OracleSession for TscSession {
    fn submit(&mut self, units: &[&Path]) -> Verdict {
        if let Some(failure) = &self.failure {
            return Verdict::Failed(OracleFailure::Unavailable {
                reason: format!("session already failed: {failure}"),
            });
        }
        if let Err(failure) = self.drain() {
            return self.fail(failure);
        }

        let write = self.candidate(units).and_then(|doc| match &self.copy {
            Some(copy) => doc.write_atomic(copy.path()),
            None => Err(StorageError::WriteRejected {
                reason: "configuration copy already removed".to_string(),
            }),
        });
        if let Err(err) = write {
            return self.fail(OracleFailure::Unavailable {
                reason: err.to_string(),
            });
        }

        match self.await_signal(self.submit_timeout) {
            Ok(count) => Verdict::Errors(count),
            Err(failure) => self.fail(failure),
        }
    }

    fn release(mut self) -> Result<(), OracleError> {
        self.terminate();
        if let Some(copy) = self.copy.take() {
            let path = copy.path().to_path_buf();
            copy.close()
                .map_err(|source| OracleError::Io { path, source })?;
        }
        Ok(())
    }
}

impl Drop for TscSession {
    fn drop(&mut self) {
        self.terminate();
    }
}
