// src/runtime/docker.rs

//! # Docker CLI Runtime
//!
//! [`DockerCli`] implements [`ContainerRuntime`] by shelling out to the
//! `docker` binary (`ps`, `inspect`, `exec`). Captured executions drain the
//! child's output on a background thread that is joined before the call
//! returns, so the remote write side never stalls against an unread pipe.
//! List, inspect and captured-exec calls are bounded by a configurable
//! timeout enforced through a try-wait/kill poll loop; interactive sessions
//! legitimately own the terminal and are never timed out.

use crate::runtime::{ContainerDetails, ContainerRuntime, ExecMode, ExecRequest, RuntimeError};
use serde::Deserialize;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval of the bounded-wait loop.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Explicit configuration for a [`DockerCli`] handle.
#[derive(Debug, Clone)]
pub struct DockerCliConfig {
    /// Name or path of the docker client binary.
    pub binary: String,
    /// Whether `list_containers` also reports stopped containers.
    pub include_stopped: bool,
    /// Upper bound for list/inspect calls and the captured-exec drain.
    /// `None` disables the bound entirely.
    pub command_timeout: Option<Duration>,
}

impl Default for DockerCliConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            include_stopped: true,
            command_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// A [`ContainerRuntime`] backed by the local docker client binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    config: DockerCliConfig,
}

impl DockerCli {
    /// Creates a handle from an explicit configuration.
    pub fn new(config: DockerCliConfig) -> Self {
        Self { config }
    }

    fn exec_captured(&self, request: &ExecRequest) -> Result<String, RuntimeError> {
        let program = format!("{} exec", self.config.binary);
        log::trace!(
            "Captured exec in '{}': {:?}",
            request.container_id,
            request.command
        );

        let mut child = Command::new(&self.config.binary)
            .args(exec_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout_reader = spawn_drain(child.stdout.take(), &program)?;
        let stderr_reader = spawn_drain(child.stderr.take(), &program)?;

        let status = wait_with_deadline(&mut child, &program, self.config.command_timeout)?;
        let stdout_bytes = join_drain(stdout_reader, &program)?;
        let stderr_bytes = join_drain(stderr_reader, &program)?;

        // The docker client reserves 125-127 for failures to create or start
        // the exec; any other code belongs to the remote command and is not
        // part of the transport contract.
        if matches!(status.code(), Some(125..=127)) {
            return Err(RuntimeError::CommandFailed {
                program,
                detail: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
            });
        }

        String::from_utf8(stdout_bytes)
            .map_err(|source| RuntimeError::NonUtf8Output { program, source })
    }

    fn exec_interactive(&self, request: &ExecRequest) -> Result<(), RuntimeError> {
        let program = format!("{} exec", self.config.binary);
        log::trace!(
            "Interactive exec in '{}': {:?}",
            request.container_id,
            request.command
        );

        // Stdin/stdout/stderr are inherited: the session owns the calling
        // terminal until the remote command ends or the local streams close.
        let status = Command::new(&self.config.binary)
            .args(exec_args(request))
            .status()
            .map_err(|source| RuntimeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if matches!(status.code(), Some(125..=127)) {
            return Err(RuntimeError::CommandFailed {
                program,
                detail: format!("the exec could not be started (exit status {status})"),
            });
        }

        Ok(())
    }

    fn run_and_capture(&self, args: &[String], program: String) -> Result<String, RuntimeError> {
        let mut child = Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout_reader = spawn_drain(child.stdout.take(), &program)?;
        let stderr_reader = spawn_drain(child.stderr.take(), &program)?;

        let status = wait_with_deadline(&mut child, &program, self.config.command_timeout)?;
        let stdout_bytes = join_drain(stdout_reader, &program)?;
        let stderr_bytes = join_drain(stderr_reader, &program)?;

        if !status.success() {
            return Err(RuntimeError::CommandFailed {
                program,
                detail: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
            });
        }

        String::from_utf8(stdout_bytes)
            .map_err(|source| RuntimeError::NonUtf8Output { program, source })
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DockerCliConfig::default())
    }
}

impl ContainerRuntime for DockerCli {
    fn list_containers(&self) -> Result<Vec<String>, RuntimeError> {
        let mut args: Vec<String> = vec!["ps".into(), "-q".into(), "--no-trunc".into()];
        if self.config.include_stopped {
            args.push("-a".into());
        }

        let program = format!("{} ps", self.config.binary);
        let output = self.run_and_capture(&args, program)?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let args: Vec<String> = vec![
            "inspect".into(),
            "--type".into(),
            "container".into(),
            id.into(),
        ];

        let program = format!("{} inspect", self.config.binary);
        let output = self.run_and_capture(&args, program)?;
        parse_inspect_output(id, &output)
    }

    fn exec(&self, request: &ExecRequest) -> Result<String, RuntimeError> {
        match request.mode {
            ExecMode::Captured => self.exec_captured(request),
            ExecMode::Interactive => {
                self.exec_interactive(request)?;
                Ok(String::new())
            }
        }
    }
}

// --- docker exec argument assembly ---

fn exec_args(request: &ExecRequest) -> Vec<String> {
    let mut args: Vec<String> = vec!["exec".into()];
    if request.mode == ExecMode::Interactive {
        args.push("-i".into());
        args.push("-t".into());
    }
    if let Some(user) = &request.user {
        args.push("-u".into());
        args.push(user.clone());
    }
    args.push(request.container_id.clone());
    args.extend(request.command.iter().cloned());
    args
}

// --- docker inspect JSON ---

#[derive(Deserialize)]
struct InspectRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Config")]
    config: InspectConfig,
}

#[derive(Deserialize)]
struct InspectConfig {
    #[serde(rename = "Env")]
    env: Option<Vec<String>>,
}

fn parse_inspect_output(id: &str, output: &str) -> Result<ContainerDetails, RuntimeError> {
    let records: Vec<InspectRecord> =
        serde_json::from_str(output).map_err(|e| RuntimeError::UnexpectedInspectOutput {
            id: id.to_string(),
            detail: e.to_string(),
        })?;

    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| RuntimeError::UnexpectedInspectOutput {
            id: id.to_string(),
            detail: "inspect returned an empty record list".to_string(),
        })?;

    Ok(ContainerDetails {
        name: record.name,
        env: record.config.env.unwrap_or_default(),
    })
}

// --- bounded wait & background drain helpers ---

/// Waits for `child` to exit, killing it once `timeout` elapses.
fn wait_with_deadline(
    child: &mut Child,
    program: &str,
    timeout: Option<Duration>,
) -> Result<ExitStatus, RuntimeError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if let Some(limit) = timeout {
                    if started.elapsed() >= limit {
                        log::warn!("'{}' hit the {:?} deadline, killing it.", program, limit);
                        if let Err(e) = child.kill() {
                            log::warn!("Failed to kill child process {}: {}", child.id(), e);
                        }
                        child.wait().ok();
                        return Err(RuntimeError::Timeout {
                            program: program.to_string(),
                            timeout: limit,
                        });
                    }
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(source) => {
                return Err(RuntimeError::Io {
                    program: program.to_string(),
                    source,
                });
            }
        }
    }
}

/// Starts a thread that reads `stream` to EOF while the child runs.
fn spawn_drain<R: Read + Send + 'static>(
    stream: Option<R>,
    program: &str,
) -> Result<JoinHandle<std::io::Result<Vec<u8>>>, RuntimeError> {
    let mut stream = stream.ok_or_else(|| RuntimeError::CommandFailed {
        program: program.to_string(),
        detail: "child process was spawned without a pipe".to_string(),
    })?;
    Ok(thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).map(|_| buffer)
    }))
}

/// Joins a drain thread, yielding the complete buffered bytes.
fn join_drain(
    handle: JoinHandle<std::io::Result<Vec<u8>>>,
    program: &str,
) -> Result<Vec<u8>, RuntimeError> {
    let joined = handle.join().map_err(|_| RuntimeError::CommandFailed {
        program: program.to_string(),
        detail: "output drain thread panicked".to_string(),
    })?;
    joined.map_err(|source| RuntimeError::Io {
        program: program.to_string(),
        source,
    })
}
