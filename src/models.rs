// src/models.rs

use serde::{Deserialize, Serialize};

// --- MANIFEST MODELS (what is read from the YAML file inside a container) ---

/// The deserialized structure of a command manifest.
///
/// The manifest is the YAML document found at the path a container advertises
/// in its `FLOWER_PATH` environment variable. Command names are lookup keys
/// and *should* be unique; duplicates are an authoring error that is not
/// rejected here — lookups take the first match.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowerManifest {
    /// Free-form manifest version string, informational only.
    pub version: Option<String>,
    /// Ordered list of commands the container exposes.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// A single invocable command declared in a manifest.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Lookup key used by `Flower::command` and `Flower::dispatch`.
    pub name: String,
    /// Executable path or name, run as-is inside the container.
    pub bin: String,
    /// Optional working directory to change into before running `bin`.
    pub context: Option<String>,
    /// Optional user the runtime should run the command as.
    pub user: Option<String>,
    /// One-line usage synopsis shown by front-ends.
    pub usage: Option<String>,
    /// Longer help text shown by front-ends.
    pub help: Option<String>,
    /// Nested sub-command/option metadata for completion and help rendering.
    /// Never consulted by dispatch.
    #[serde(default)]
    pub sub: Vec<SubCommandSpec>,
}

/// A node of the recursive sub-command/option tree.
///
/// Purely presentational: front-ends use it for completion and help, the
/// core never executes it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubCommandSpec {
    /// Completion token for this sub-command or option.
    pub name: String,
    /// One-line usage synopsis shown by front-ends.
    pub usage: Option<String>,
    /// Longer help text shown by front-ends.
    pub help: Option<String>,
    /// Children of this node, to arbitrary depth.
    #[serde(default)]
    pub sub: Vec<SubCommandSpec>,
}

impl FlowerManifest {
    /// Deserializes a manifest from YAML text.
    ///
    /// # Errors
    /// Returns the underlying `serde_yaml` error verbatim when the text does
    /// not conform to the manifest schema.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
