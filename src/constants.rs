// src/constants.rs

/// The environment variable a container sets to advertise the path of its
/// command manifest.
pub const FLOWER_PATH_ENV: &str = "FLOWER_PATH";

/// Length of the abbreviated container identifier, matching the runtime's
/// own short-id convention.
pub const SHORT_ID_LENGTH: usize = 12;

/// Binary used to read the manifest file inside a container.
pub const MANIFEST_READ_BIN: &str = "cat";
