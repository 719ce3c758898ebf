//! # colibri
//!
//! Discovers containers that advertise a command manifest through the
//! `FLOWER_PATH` environment variable, parses that manifest, and dispatches
//! the commands it declares inside the container — either capturing their
//! output or attaching the calling terminal for a fully interactive session.
//!
//! The crate is the core behind an interactive front-end; the front-end
//! itself (prompt, completion, argument parsing, coloring) lives elsewhere
//! and consumes only [`Colibri::refresh`], [`Colibri::list_identifiers`],
//! [`Colibri::lookup`], [`Flower::parse`] and [`Flower::dispatch`].

pub mod constants;
pub mod core;
pub mod models;
pub mod runtime;

pub use crate::core::colibri::{Colibri, ColibriError};
pub use crate::core::flower::{Flower, FlowerError};
pub use crate::core::transport::Container;
pub use crate::models::{CommandSpec, FlowerManifest, SubCommandSpec};
pub use crate::runtime::docker::{DockerCli, DockerCliConfig};
pub use crate::runtime::{ContainerDetails, ContainerRuntime, ExecMode, ExecRequest, RuntimeError};
