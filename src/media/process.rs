use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// How often a running child is checked for exit and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run-wide cancellation flag shared by every worker and external process.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill running tools and stop starting new ones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn '{tool}' (is it installed and on PATH?): {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' was cancelled")]
    Cancelled { tool: String },

    #[error("'{tool}' exited with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{tool}': {reason}")]
    Io { tool: String, reason: String },

    #[error("'{tool}' produced unexpected output: {reason}")]
    Parse { tool: String, reason: String },
}

impl ToolError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Run `cmd` to completion, killing it as soon as `cancel` is raised.
///
/// stdout and stderr are drained on helper threads so a chatty tool never blocks on a full pipe.
pub fn run_tool(cmd: &mut Command, cancel: &CancelHandle) -> Result<ToolOutput, ToolError> {
    let tool = cmd.get_program().to_string_lossy().into_owned();
    if cancel.is_cancelled() {
        return Err(ToolError::Cancelled { tool });
    }

    tracing::trace!(?cmd, "spawn");
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let stdout_drain = drain(child.stdout.take());
    let stderr_drain = drain(child.stderr.take());

    let status = match wait_or_kill(&mut child, cancel) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = join_drain(stdout_drain);
            let _ = join_drain(stderr_drain);
            return Err(ToolError::Cancelled { tool });
        }
        Err(e) => {
            return Err(ToolError::Io {
                tool,
                reason: format!("failed to wait for process: {e}"),
            });
        }
    };

    let stdout = join_drain(stdout_drain).map_err(|reason| ToolError::Io {
        tool: tool.clone(),
        reason,
    })?;
    let stderr = join_drain(stderr_drain).map_err(|reason| ToolError::Io {
        tool: tool.clone(),
        reason,
    })?;

    if !status.success() {
        return Err(ToolError::Failed {
            tool,
            status,
            stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
        });
    }
    Ok(ToolOutput { stdout })
}

/// `Ok(None)` means the child was killed because of cancellation.
fn wait_or_kill(child: &mut Child, cancel: &CancelHandle) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(handle: Drain) -> Result<Vec<u8>, String> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| "output drain thread panicked".to_owned())?
            .map_err(|e| format!("output read failed: {e}")),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/process.rs"]
mod tests;
