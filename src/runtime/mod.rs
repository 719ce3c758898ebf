//! # Container Runtime Abstraction
//!
//! Defines the narrow slice of a container runtime's control API that the
//! rest of the crate consumes: list containers, inspect one container, and
//! create + start an execution inside one. Production code talks to the
//! Docker CLI through [`docker::DockerCli`]; tests swap in a scripted fake.

pub mod docker;

use std::time::Duration;
use thiserror::Error;

/// How an execution attaches to the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Attach only the output stream, no TTY. The runtime drains the stream
    /// to completion and returns the full text once the command ends.
    Captured,
    /// Attach the calling process's stdin/stdout/stderr with a TTY and block
    /// until the remote command terminates. Nothing is captured.
    Interactive,
}

/// One execution to create and start inside a container.
///
/// `command` is an ordered list of discrete tokens (binary first); the
/// runtime passes them through without shell interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Full id of the container to execute in.
    pub container_id: String,
    /// Discrete command tokens, binary first.
    pub command: Vec<String>,
    /// User the runtime should run the command as, when set.
    pub user: Option<String>,
    /// Attachment mode of the execution.
    pub mode: ExecMode,
}

/// The name and environment snapshot a runtime reports for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    /// Display name as reported by the runtime (may carry a leading `/`).
    pub name: String,
    /// Ordered `KEY=VALUE` assignment strings, snapshotted at inspect time.
    pub env: Vec<String>,
}

/// Failures of the runtime control API or of an execution's creation/start.
///
/// A remote command's own exit status is deliberately *not* represented
/// here: the transport contract never translates it into an error.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("could not spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' failed: {detail}")]
    CommandFailed { program: String, detail: String },
    #[error("'{program}' did not complete within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("i/o error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' produced output that was not valid UTF-8")]
    NonUtf8Output {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("unexpected inspect output for container '{id}': {detail}")]
    UnexpectedInspectOutput { id: String, detail: String },
}

/// The runtime operations the discovery engine and the exec transport need.
///
/// Implementations are expected to be cheap to share (`Send + Sync`); every
/// component takes an explicit handle at construction — there is no
/// process-wide runtime singleton.
pub trait ContainerRuntime: Send + Sync {
    /// Lists container ids (full ids), including stopped containers when the
    /// implementation is configured to do so.
    fn list_containers(&self) -> Result<Vec<String>, RuntimeError>;

    /// Reports the display name and environment snapshot of one container.
    fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;

    /// Creates and starts an execution inside a container.
    ///
    /// Captured mode returns the fully drained output text; interactive mode
    /// returns an empty string after the session ends. Errors cover only the
    /// creation/start of the execution, never the remote exit status.
    fn exec(&self, request: &ExecRequest) -> Result<String, RuntimeError>;
}
