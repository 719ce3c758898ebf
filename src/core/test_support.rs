// src/core/test_support.rs

//! Scripted in-memory [`ContainerRuntime`] used by the unit tests of the
//! transport, flower and discovery modules.

use crate::runtime::{ContainerDetails, ContainerRuntime, ExecRequest, RuntimeError};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeRuntime {
    containers: Mutex<Vec<String>>,
    details: Mutex<HashMap<String, ContainerDetails>>,
    exec_outputs: Mutex<HashMap<String, String>>,
    inspect_log: Mutex<Vec<String>>,
    exec_log: Mutex<Vec<ExecRequest>>,
    next_list_failure: Mutex<Option<String>>,
    next_inspect_failure: Mutex<Option<String>>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_container(&self, id: &str, name: &str, env: &[&str]) {
        self.containers.lock().unwrap().push(id.to_string());
        self.details.lock().unwrap().insert(
            id.to_string(),
            ContainerDetails {
                name: name.to_string(),
                env: env.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub(crate) fn remove_container(&self, id: &str) {
        self.containers.lock().unwrap().retain(|known| known != id);
        self.details.lock().unwrap().remove(id);
    }

    /// Scripts the captured output for a command, keyed by its tokens
    /// joined with single spaces.
    pub(crate) fn script_exec(&self, command: &str, output: &str) {
        self.exec_outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), output.to_string());
    }

    pub(crate) fn fail_next_list(&self, detail: &str) {
        *self.next_list_failure.lock().unwrap() = Some(detail.to_string());
    }

    pub(crate) fn fail_next_inspect(&self, detail: &str) {
        *self.next_inspect_failure.lock().unwrap() = Some(detail.to_string());
    }

    pub(crate) fn inspect_count(&self) -> usize {
        self.inspect_log.lock().unwrap().len()
    }

    pub(crate) fn inspect_log(&self) -> Vec<String> {
        self.inspect_log.lock().unwrap().clone()
    }

    pub(crate) fn exec_requests(&self) -> Vec<ExecRequest> {
        self.exec_log.lock().unwrap().clone()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn list_containers(&self) -> Result<Vec<String>, RuntimeError> {
        if let Some(detail) = self.next_list_failure.lock().unwrap().take() {
            return Err(RuntimeError::CommandFailed {
                program: "fake list".to_string(),
                detail,
            });
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        self.inspect_log.lock().unwrap().push(id.to_string());
        if let Some(detail) = self.next_inspect_failure.lock().unwrap().take() {
            return Err(RuntimeError::CommandFailed {
                program: "fake inspect".to_string(),
                detail,
            });
        }
        self.details.lock().unwrap().get(id).cloned().ok_or_else(|| {
            RuntimeError::UnexpectedInspectOutput {
                id: id.to_string(),
                detail: "no such container".to_string(),
            }
        })
    }

    fn exec(&self, request: &ExecRequest) -> Result<String, RuntimeError> {
        self.exec_log.lock().unwrap().push(request.clone());
        let key = request.command.join(" ");
        Ok(self
            .exec_outputs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}
