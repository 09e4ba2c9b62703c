use std::path::PathBuf;

use crate::settings::ConfigError;

/// Errors surfaced to the host by [`crate::Vitals`].
#[derive(Debug)]
pub enum VitalsError {
    /// The primary counter source is absent; the engine cannot run here.
    SourceMissing(PathBuf),
    /// No property has this name.
    UnknownProperty(String),
    /// `start` was called outside a tokio runtime.
    NoRuntime,
    Config(ConfigError),
}

impl std::fmt::Display for VitalsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VitalsError::SourceMissing(path) => {
                write!(f, "counter source {} not found", path.display())
            }
            VitalsError::UnknownProperty(name) => write!(f, "unknown property: {}", name),
            VitalsError::NoRuntime => write!(f, "no tokio runtime to run sampling loops on"),
            VitalsError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for VitalsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VitalsError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for VitalsError {
    fn from(e: ConfigError) -> Self {
        VitalsError::Config(e)
    }
}
