//! External process worker
//!
//! Runs a third-party command-line tool from the tools directory under a hard
//! wall-clock deadline. Output is collected while the process runs, so
//! whatever was printed before a kill is still returned.

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default deadline for one tool invocation
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// How long output readers may run on once the tool has exited
const READER_GRACE: Duration = Duration::from_millis(250);

/// Worker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Directory tools are resolved against; also the working directory
    pub tools_dir: PathBuf,
    /// Program that runs the tool (e.g. `python3`); `None` executes it directly
    pub interpreter: Option<String>,
    /// Wall-clock deadline in seconds
    pub timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("tools"),
            interpreter: Some("python3".to_string()),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

/// Outcome of one tool run; never an error, always a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessOutput {
    pub fn timed_out(&self) -> bool {
        self.error.as_deref() == Some("Timeout")
    }
}

type Sink = Arc<Mutex<Vec<u8>>>;

/// Copy a child stream into a shared buffer until EOF
fn drain<R>(mut stream: R, sink: Sink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => sink.lock().extend_from_slice(&buf[..n]),
            }
        }
    })
}

/// Give readers a short window to drain what the tool left in the pipes.
///
/// A background process spawned by the tool can hold the pipes open long after
/// the tool itself exited; its output is abandoned.
async fn settle(tool_path: &str, mut readers: Vec<JoinHandle<()>>) {
    let drained = tokio::time::timeout(READER_GRACE, join_all(readers.iter_mut())).await;
    if drained.is_err() {
        debug!("Output of {} still open after exit, detaching readers", tool_path);
    }
    for reader in &readers {
        reader.abort();
    }
}

fn snapshot(sink: &Sink) -> String {
    String::from_utf8_lossy(&sink.lock()).into_owned()
}

/// Runs external tools; holds no state between calls
#[derive(Debug, Clone, Default)]
pub struct ProcessWorker {
    config: WorkerConfig,
}

impl ProcessWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn command(&self, tool_path: &str, args: &[String]) -> Command {
        let tool = self.config.tools_dir.join(tool_path);
        let mut cmd = match &self.config.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&tool);
                cmd
            }
            None => Command::new(&tool),
        };
        cmd.args(args)
            .current_dir(&self.config.tools_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run `tool_path` (relative to the tools directory) with `args`
    pub async fn execute(&self, tool_path: &str, args: &[String]) -> ProcessOutput {
        self.execute_with_deadline(tool_path, args, self.timeout()).await
    }

    pub async fn execute_with_deadline(
        &self,
        tool_path: &str,
        args: &[String],
        deadline: Duration,
    ) -> ProcessOutput {
        info!("Executing tool {} {}", tool_path, args.join(" "));

        let mut child = match self.command(tool_path, args).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", tool_path, e);
                return ProcessOutput {
                    success: false,
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };

        let stdout: Sink = Arc::default();
        let stderr: Sink = Arc::default();
        let readers: Vec<JoinHandle<()>> = [
            child.stdout.take().map(|s| drain(s, stdout.clone())),
            child.stderr.take().map(|s| drain(s, stderr.clone())),
        ]
        .into_iter()
        .flatten()
        .collect();

        let finished = tokio::time::timeout(deadline, child.wait()).await;
        if finished.is_err() {
            warn!(
                "Tool {} exceeded {}s deadline, killing",
                tool_path,
                deadline.as_secs_f64()
            );
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {}: {}", tool_path, e);
            }
        }
        settle(tool_path, readers).await;

        match finished {
            Ok(Ok(status)) if status.success() => {
                debug!("Tool {} finished successfully", tool_path);
                ProcessOutput {
                    success: true,
                    stdout: snapshot(&stdout),
                    stderr: snapshot(&stderr),
                    error: None,
                }
            }
            Ok(Ok(status)) => {
                let error = match status.code() {
                    Some(code) => format!("exit code {}", code),
                    None => "terminated by signal".to_string(),
                };
                info!("Tool {} failed: {}", tool_path, error);
                ProcessOutput {
                    success: false,
                    stdout: snapshot(&stdout),
                    stderr: snapshot(&stderr),
                    error: Some(error),
                }
            }
            Ok(Err(e)) => ProcessOutput {
                success: false,
                stdout: snapshot(&stdout),
                stderr: snapshot(&stderr),
                error: Some(e.to_string()),
            },
            Err(_) => {
                let mut stderr = snapshot(&stderr);
                stderr.push_str(&format!(
                    "\n[Timeout] Process killed after {}s",
                    deadline.as_secs()
                ));
                ProcessOutput {
                    success: false,
                    stdout: snapshot(&stdout),
                    stderr,
                    error: Some("Timeout".to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn worker_with(script: &str, timeout_secs: u64) -> (TempDir, ProcessWorker) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tool.sh"), script).unwrap();
        let worker = ProcessWorker::new(WorkerConfig {
            tools_dir: dir.path().to_path_buf(),
            interpreter: Some("sh".to_string()),
            timeout_secs,
        });
        (dir, worker)
    }

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.interpreter.as_deref(), Some("python3"));
    }

    #[tokio::test]
    async fn test_success_ignores_stderr() {
        let (_dir, worker) = worker_with("echo \"hello $1\"\necho noisy >&2\nexit 0\n", 10);
        let out = worker.execute("tool.sh", &["bob".to_string()]).await;
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello bob");
        assert!(out.stderr.contains("noisy"));
        assert_eq!(out.error, None);
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_stdout() {
        let (_dir, worker) = worker_with("echo partial\nexit 3\n", 10);
        let out = worker.execute("tool.sh", &[]).await;
        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some("exit code 3"));
        assert_eq!(out.stdout.trim(), "partial");
    }

    #[tokio::test]
    async fn test_runs_inside_tools_dir() {
        let (dir, worker) = worker_with("cat data.txt\n", 10);
        fs::write(dir.path().join("data.txt"), "resource").unwrap();
        let out = worker.execute("tool.sh", &[]).await;
        assert!(out.success);
        assert_eq!(out.stdout, "resource");
    }

    #[tokio::test]
    async fn test_deadline_kills_and_keeps_partial_output() {
        let (_dir, worker) = worker_with("echo early\nexec sleep 30\n", 10);
        let out = worker
            .execute_with_deadline("tool.sh", &[], Duration::from_millis(800))
            .await;
        assert!(!out.success);
        assert!(out.timed_out());
        assert_eq!(out.error.as_deref(), Some("Timeout"));
        assert!(out.stderr.contains("[Timeout]"));
        assert_eq!(out.stdout.trim(), "early");
    }

    #[tokio::test]
    async fn test_background_child_does_not_hold_result() {
        let (_dir, worker) = worker_with("echo hi\nsleep 3 &\nexit 0\n", 10);
        let started = std::time::Instant::now();
        let out = worker
            .execute_with_deadline("tool.sh", &[], Duration::from_secs(2))
            .await;
        assert!(out.success);
        assert_eq!(out.error, None);
        assert_eq!(out.stdout.trim(), "hi");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let worker = ProcessWorker::new(WorkerConfig {
            tools_dir: dir.path().to_path_buf(),
            interpreter: Some("/nonexistent/interpreter".to_string()),
            timeout_secs: 5,
        });
        let out = worker.execute("tool.py", &[]).await;
        assert!(!out.success);
        assert!(out.error.is_some());
        assert!(out.stdout.is_empty());
    }
}
