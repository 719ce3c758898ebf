// src/core/transport.rs

//! # Exec Transport
//!
//! [`Container`] is one addressable workload: the immutable snapshot taken
//! by a single inspect call (id, short id, display name, environment) plus
//! the runtime handle needed to run commands inside it. Already-known
//! containers are never re-inspected; the snapshot lives for as long as the
//! cache entry does.

use crate::constants::SHORT_ID_LENGTH;
use crate::runtime::{ContainerRuntime, ExecMode, ExecRequest, RuntimeError};
use std::fmt;
use std::sync::Arc;

/// An inspected container and the transport to execute commands inside it.
#[derive(Clone)]
pub struct Container {
    runtime: Arc<dyn ContainerRuntime>,
    id: String,
    short_id: String,
    name: String,
    env: Vec<String>,
}

impl Container {
    /// Inspects `id` through the runtime and snapshots the result.
    ///
    /// # Errors
    /// Propagates the runtime's inspect failure untouched; the caller treats
    /// it as fatal for the surrounding refresh.
    pub fn inspect(
        runtime: Arc<dyn ContainerRuntime>,
        id: impl Into<String>,
    ) -> Result<Self, RuntimeError> {
        let id = id.into();
        let details = runtime.inspect_container(&id)?;
        let short_id: String = id.chars().take(SHORT_ID_LENGTH).collect();
        let name = details.name.trim_start_matches('/').to_string();
        log::debug!("Inspected container '{}' ('{}')", short_id, name);

        Ok(Self {
            runtime,
            id,
            short_id,
            name,
            env: details.env,
        })
    }

    /// Full container identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fixed-length prefix of the full identifier.
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// Display name, with the runtime's leading path separator stripped.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks `key` up in the environment snapshot.
    ///
    /// Assignments are split on the *first* `=` only, so values may
    /// themselves contain `=`. Returns `""` when the key is absent.
    pub fn env_value(&self, key: &str) -> &str {
        for assignment in &self.env {
            if let Some((name, value)) = assignment.split_once('=') {
                if name == key {
                    return value;
                }
            }
        }
        ""
    }

    /// Runs `command` inside the container.
    ///
    /// Tokens are passed to the runtime without shell interpretation. In
    /// captured mode the call blocks until the remote output is fully
    /// drained and returns it; in interactive mode it blocks until the
    /// session ends and returns an empty string. The remote exit status is
    /// never inspected.
    ///
    /// # Errors
    /// Only creation/start failures of the execution surface here; they are
    /// recoverable from the caller's point of view.
    pub fn exec(
        &self,
        command: &[String],
        user: Option<&str>,
        mode: ExecMode,
    ) -> Result<String, RuntimeError> {
        let request = ExecRequest {
            container_id: self.id.clone(),
            command: command.to_vec(),
            user: user.map(str::to_string),
            mode,
        };
        self.runtime.exec(&request)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("short_id", &self.short_id)
            .field("name", &self.name)
            .field("env", &self.env.len())
            .finish_non_exhaustive()
    }
}
