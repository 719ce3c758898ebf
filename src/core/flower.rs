// src/core/flower.rs

//! # Flower
//!
//! A [`Flower`] is a container known to expose commands: the pairing of an
//! inspected [`Container`] with the manifest path it advertised and, once
//! [`Flower::parse`] has succeeded, the parsed manifest itself.

use crate::constants::MANIFEST_READ_BIN;
use crate::core::transport::Container;
use crate::models::{CommandSpec, FlowerManifest};
use crate::runtime::{ExecMode, RuntimeError};
use thiserror::Error;

/// Failures of manifest parsing and command dispatch.
#[derive(Error, Debug)]
pub enum FlowerError {
    #[error("flower has not been parsed yet")]
    NotParsed,
    #[error("command '{0}' not found in the manifest")]
    CommandNotFound(String),
    #[error("manifest at '{path}' is not a valid command manifest: {source}")]
    Manifest {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Transport(#[from] RuntimeError),
    #[error("working directory '{0}' cannot be quoted for the shell")]
    UnquotableContext(String),
}

/// A container exposing commands, with its manifest path and parsed manifest.
#[derive(Debug, Clone)]
pub struct Flower {
    container: Container,
    path: String,
    manifest: Option<FlowerManifest>,
}

impl Flower {
    /// Pairs a container with its advertised manifest path.
    ///
    /// Callers only construct a `Flower` once they have seen a non-empty
    /// path, so the invariant "a cache entry always has a manifest path"
    /// holds by construction.
    pub(crate) fn new(container: Container, path: String) -> Self {
        debug_assert!(!path.is_empty());
        Self {
            container,
            path,
            manifest: None,
        }
    }

    /// The container this flower lives in.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Path of the manifest inside the container.
    pub fn manifest_path(&self) -> &str {
        &self.path
    }

    /// The parsed manifest, absent until [`Flower::parse`] succeeds.
    pub fn manifest(&self) -> Option<&FlowerManifest> {
        self.manifest.as_ref()
    }

    /// Reads the manifest through the transport and deserializes it.
    ///
    /// A successful parse *replaces* any previously stored manifest.
    ///
    /// # Errors
    /// Transport failures and YAML errors surface verbatim; the stored
    /// manifest is left untouched in that case.
    pub fn parse(&mut self) -> Result<&FlowerManifest, FlowerError> {
        log::debug!(
            "Parsing manifest '{}' from container '{}'",
            self.path,
            self.container.short_id()
        );
        let read = [MANIFEST_READ_BIN.to_string(), self.path.clone()];
        let captured = self.container.exec(&read, None, ExecMode::Captured)?;

        let manifest =
            FlowerManifest::from_yaml(&captured).map_err(|source| FlowerError::Manifest {
                path: self.path.clone(),
                source,
            })?;

        Ok(&*self.manifest.insert(manifest))
    }

    /// Resolves a command by exact name, first match wins.
    ///
    /// # Errors
    /// `NotParsed` before a successful [`Flower::parse`]; `CommandNotFound`
    /// when the name is absent from the manifest.
    pub fn command(&self, name: &str) -> Result<&CommandSpec, FlowerError> {
        let manifest = self.manifest.as_ref().ok_or(FlowerError::NotParsed)?;
        manifest
            .commands
            .iter()
            .find(|command| command.name == name)
            .ok_or_else(|| FlowerError::CommandNotFound(name.to_string()))
    }

    /// Resolves `name` and runs it inside the container with `args` appended
    /// verbatim, returning the transport's result unchanged.
    ///
    /// When the command declares a working-directory context, only the
    /// directory-change prefix is shell-interpreted; the binary and its
    /// arguments still travel as discrete tokens. The command's `user` is
    /// forwarded to the runtime. The nested `sub` tree is never consulted.
    pub fn dispatch(
        &self,
        name: &str,
        mode: ExecMode,
        args: &[String],
    ) -> Result<String, FlowerError> {
        let command = self.command(name)?;
        let tokens = build_invocation(command, args)?;
        log::debug!(
            "Dispatching '{}' in container '{}': {:?}",
            name,
            self.container.short_id(),
            tokens
        );
        Ok(self.container.exec(&tokens, command.user.as_deref(), mode)?)
    }
}

/// Builds the token sequence for one resolved command.
fn build_invocation(command: &CommandSpec, args: &[String]) -> Result<Vec<String>, FlowerError> {
    let mut tokens = Vec::with_capacity(args.len() + 4);

    if let Some(context) = command.context.as_deref().filter(|c| !c.is_empty()) {
        let quoted = shlex::try_quote(context)
            .map_err(|_| FlowerError::UnquotableContext(context.to_string()))?;
        tokens.push("sh".to_string());
        tokens.push("-c".to_string());
        // Only this prefix is shell-interpreted; `$0`/`$@` re-enter the
        // binary and arguments as discrete, uninterpolated tokens.
        tokens.push(format!("cd {quoted} && exec \"$0\" \"$@\""));
    }

    tokens.push(command.bin.clone());
    tokens.extend(args.iter().cloned());
    Ok(tokens)
}
