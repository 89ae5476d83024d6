use std::path::PathBuf;

/// Failures the engine surfaces upward. Everything else degrades to
/// zero/neutral values instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("malformed input at `{path}`: {message}")]
    MalformedInput { path: String, message: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::MalformedInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable wire code for the sidecar protocol.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MalformedInput { .. } => "bad_input",
            EngineError::InvalidConfig(_) => "config_invalid",
            EngineError::ConfigIo { .. } => "config_io",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::MalformedInput { path, .. } => Some(serde_json::json!({ "path": path })),
            EngineError::ConfigIo { path, .. } => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            EngineError::InvalidConfig(_) => None,
        }
    }
}
