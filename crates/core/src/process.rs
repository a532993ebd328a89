//! Process Execution
//!
//! Secure wrapper around external command execution: merged environment,
//! scripted stdin, concurrent output draining, timeout-bounded waits and
//! graceful-then-forced termination.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Default timeout for synchronous executions
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How long a killed process gets to exit before termination is forced
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Process execution errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Process timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scripted input fed to a child process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdinScript {
    /// No input; the child reads EOF
    #[default]
    None,
    /// Answer a single prompt with one line
    AnswerOnce(String),
    /// Answer up to `times` prompts with the same line, stopping early
    /// once the child no longer reads its stdin
    RepeatLine { line: String, times: usize },
}

/// A single invocation of an external command.
///
/// Environment overrides are merged onto the inherited environment, so the
/// child keeps `PATH`, locale and friends.
#[derive(Debug, Clone)]
pub struct ExecutionSpec {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout: Duration,
    stdin: StdinScript,
}

impl ExecutionSpec {
    /// Create a spec for the given executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            stdin: StdinScript::None,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment override, merged over the inherited environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the timeout for synchronous execution
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the stdin script
    pub fn stdin_script(mut self, stdin: StdinScript) -> Self {
        self.stdin = stdin;
        self
    }

    /// The executable this spec runs
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The full command line, for logging
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn build_command(&self, capture_output: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if capture_output {
            let stdin = if self.stdin == StdinScript::None {
                Stdio::null()
            } else {
                Stdio::piped()
            };
            cmd.stdin(stdin).stdout(Stdio::piped()).stderr(Stdio::piped());
            // A cancelled execution must not leak its child.
            cmd.kill_on_drop(true);
        } else {
            // Detached processes take no input and nobody drains their
            // output, so a pipe would eventually fill and block the child.
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        cmd
    }
}

/// Result of a synchronous execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ExecutionResult {
    /// True when the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A line of child output, for streaming consumers
#[derive(Debug, Clone)]
pub enum OutputEvent {
    Stdout(String),
    Stderr(String),
}

/// Execute a command and wait for completion.
///
/// Both output streams are drained concurrently with the wait, and the
/// result is assembled only after both drains have finished, so no line is
/// lost or truncated. On timeout the child is killed and no partial result
/// is returned.
pub async fn execute(spec: &ExecutionSpec) -> Result<ExecutionResult, ProcessError> {
    run_captured(spec, None).await
}

/// Execute a command, forwarding every output line over `events` as it is
/// read, in addition to capturing it in the returned result.
pub async fn execute_streaming(
    spec: &ExecutionSpec,
    events: mpsc::Sender<OutputEvent>,
) -> Result<ExecutionResult, ProcessError> {
    run_captured(spec, Some(events)).await
}

async fn run_captured(
    spec: &ExecutionSpec,
    forward: Option<mpsc::Sender<OutputEvent>>,
) -> Result<ExecutionResult, ProcessError> {
    debug!("Executing command: {}", spec.command_line());

    let mut child = spec
        .build_command(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: spec.program.display().to_string(),
            source,
        })?;

    // Drains must be running before stdin is fed: a child that fills its
    // output pipe while prompting would otherwise deadlock the writer.
    let stdout_task = drain_lines(child.stdout.take(), forward.clone(), OutputEvent::Stdout);
    let stderr_task = drain_lines(child.stderr.take(), forward, OutputEvent::Stderr);

    // Written but deliberately not closed: batch-script launchers on
    // Windows can hang when stdin reaches EOF before they finish reading.
    // Held until the process has exited so the pipe is released with it.
    let _stdin = feed_stdin(&mut child, &spec.stdin).await;

    let status = match tokio::time::timeout(spec.timeout, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            warn!(
                "Command timed out after {:?}: {}",
                spec.timeout,
                spec.command_line()
            );
            if let Err(e) = kill(&mut child).await {
                warn!("Failed to kill timed-out process: {}", e);
            }
            return Err(ProcessError::Timeout(spec.timeout));
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    let exit_code = status.code().unwrap_or(-1);
    if exit_code != 0 {
        warn!(
            "Command failed with exit code {}: {}",
            exit_code,
            spec.command_line()
        );
    } else {
        debug!("Command completed successfully");
    }

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
    })
}

/// Launch a command without waiting or draining, for long-running
/// processes whose output the caller does not need.
pub fn spawn_detached(spec: &ExecutionSpec) -> Result<Child, ProcessError> {
    debug!("Spawning detached command: {}", spec.command_line());

    spec.build_command(false)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: spec.program.display().to_string(),
            source,
        })
}

/// Kill a process gracefully, then forcefully if needed.
///
/// A no-op when the process has already exited.
pub async fn kill(child: &mut Child) -> Result<(), ProcessError> {
    if child.try_wait()?.is_some() {
        return Ok(());
    }

    #[cfg(unix)]
    if let Some(pid) = child.id() {
        debug!("Terminating process (pid {})", pid);
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
    #[cfg(not(unix))]
    child.start_kill()?;

    match tokio::time::timeout(KILL_GRACE, child.wait()).await {
        Ok(status) => {
            status?;
            Ok(())
        }
        Err(_) => {
            warn!("Process did not terminate gracefully, forcing termination");
            child.kill().await?;
            Ok(())
        }
    }
}

/// Write the stdin script and return the pipe, kept open until drop.
async fn feed_stdin(child: &mut Child, script: &StdinScript) -> Option<ChildStdin> {
    let mut stdin = child.stdin.take()?;

    let outcome = match script {
        StdinScript::None => Ok(()),
        StdinScript::AnswerOnce(line) => write_line(&mut stdin, line).await,
        StdinScript::RepeatLine { line, times } => {
            for n in 0..*times {
                if let Err(e) = write_line(&mut stdin, line).await {
                    // Broken pipe here just means the child stopped
                    // reading; expected, not a failure.
                    debug!("Child stopped reading stdin after {} line(s): {}", n, e);
                    break;
                }
            }
            Ok(())
        }
    };

    if let Err(e) = outcome {
        warn!("Failed to provide input to process: {}", e);
    }

    Some(stdin)
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

fn drain_lines<R>(
    stream: Option<R>,
    forward: Option<mpsc::Sender<OutputEvent>>,
    event: fn(String) -> OutputEvent,
) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut captured = Vec::new();
        let Some(stream) = stream else {
            return captured;
        };

        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(ref sender) = forward {
                        let _ = sender.send(event(line.clone())).await;
                    }
                    captured.push(line);
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Error reading stream: {}", e);
                    break;
                }
            }
        }
        captured
    })
}
