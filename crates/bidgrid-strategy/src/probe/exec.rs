//! Subprocess probe.
//!
//! The configured command runs under the platform shell with the probe
//! document in `PROBE_DATA_ENV` and on stdin. Exit code 0 accepts, anything
//! else rejects. Non-empty stderr becomes the rejection reason, cut to
//! `MAX_STDERR_REASON_BYTES`. Stdout is discarded.
//!
//! On unix the command leads its own process group. The whole group is
//! killed once the evaluation finishes, times out, or is dropped, so
//! background children never outlive the decision.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

use super::{MAX_EXEC_PROBE_DATA_BYTES, PROBE_DATA_ENV, probe_payload};
use crate::error::{BidError, BidResult};
use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy};

/// Longest stderr kept for the rejection reason. The rest is drained and
/// dropped.
pub const MAX_STDERR_REASON_BYTES: usize = 4 * 1024;

/// How long stderr may stay open after the command itself exited.
const STDERR_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ExternalCommandStrategyParams {
    /// Shell command line. Empty disables the probe.
    pub command: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExternalCommandStrategy {
    command: String,
    timeout: Duration,
}

impl ExternalCommandStrategy {
    pub fn new(params: ExternalCommandStrategyParams) -> BidResult<Self> {
        if params.command.contains('\0') {
            return Err(BidError::Config(
                "probe command must not contain NUL bytes".to_string(),
            ));
        }
        Ok(Self {
            command: params.command.trim().to_string(),
            timeout: params.timeout,
        })
    }

    async fn run(&self, payload: String) -> BidResult<(ExitStatus, Vec<u8>)> {
        let mut cmd = shell(&self.command);
        cmd.env(PROBE_DATA_ENV, &payload)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| BidError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        #[cfg(unix)]
        let _group = ProcessGroup::of(&child);

        let io_err = |source: std::io::Error| BidError::Io {
            command: self.command.clone(),
            source,
        };

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let mut captured = Vec::new();

        let status = {
            let feed = async move {
                let Some(mut stdin) = stdin else {
                    return Ok(());
                };
                match stdin.write_all(payload.as_bytes()).await {
                    // The probe is free to exit without reading its input.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            };
            let reader = read_capped(stderr, &mut captured, MAX_STDERR_REASON_BYTES);
            let wait = child.wait();
            tokio::pin!(feed, reader, wait);

            let mut fed = false;
            let mut drained = false;
            let status = loop {
                tokio::select! {
                    res = &mut feed, if !fed => {
                        res.map_err(io_err)?;
                        fed = true;
                    }
                    res = &mut reader, if !drained => {
                        res.map_err(io_err)?;
                        drained = true;
                    }
                    status = &mut wait => break status.map_err(io_err)?,
                }
            };

            // A background child may still hold stderr open. Whatever it
            // wrote so far is kept; the group kill ends it.
            if !drained {
                if let Ok(res) = tokio::time::timeout(STDERR_GRACE, &mut reader).await {
                    res.map_err(io_err)?;
                }
            }
            status
        };

        Ok((status, captured))
    }

    fn interpret(&self, status: ExitStatus, stderr: &[u8]) -> BidResponse {
        if status.success() {
            return BidResponse::accept(format!(
                "command `{}` returned a success exit code",
                self.command
            ));
        }

        let stderr = String::from_utf8_lossy(stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return BidResponse::reject(stderr.to_string());
        }

        match status.code() {
            Some(code) => BidResponse::reject(format!(
                "command `{}` returned a failed exit code ({code})",
                self.command
            )),
            None => BidResponse::reject(format!(
                "command `{}` was terminated by a signal",
                self.command
            )),
        }
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Kills the probe's process group when dropped.
#[cfg(unix)]
struct ProcessGroup(Option<i32>);

#[cfg(unix)]
impl ProcessGroup {
    fn of(child: &tokio::process::Child) -> Self {
        Self(child.id().and_then(|id| i32::try_from(id).ok()))
    }
}

#[cfg(unix)]
impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(pgid) = self.0 {
            // SAFETY: kill(2) only sends a signal. The group id is the
            // leader pid assigned by `process_group(0)` at spawn.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
}

/// Reads `source` to EOF, keeping at most `cap` bytes in `buf`.
async fn read_capped<R>(source: Option<R>, buf: &mut Vec<u8>, cap: usize) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(mut source) = source else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = source.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        let room = cap.saturating_sub(buf.len());
        buf.extend_from_slice(&chunk[..n.min(room)]);
    }
}

impl SemanticStrategy for ExternalCommandStrategy {
    fn name(&self) -> &str {
        "external-command"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            if self.command.is_empty() {
                return Ok(BidResponse::accept("probe command not configured"));
            }

            let payload = probe_payload(request, Some(MAX_EXEC_PROBE_DATA_BYTES))?;
            let (status, stderr) = tokio::time::timeout(self.timeout, self.run(payload))
                .await
                .map_err(|_| BidError::ProbeTimeout {
                    target: self.command.clone(),
                    timeout: self.timeout,
                })??;

            debug!(
                command = %self.command,
                job_id = %request.job.id,
                status = %status,
                stderr_bytes = stderr.len(),
                "probe command finished"
            );
            Ok(self.interpret(status, &stderr))
        })
    }
}
