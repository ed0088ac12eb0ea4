//! Error types for the simulator binary.
//!
//! [`EngineError`] is the top-level error type that wraps all failure
//! modes during startup and export, so `main` can propagate everything
//! with `?`.

/// Top-level error for the simulator binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: watchsim_core::config::ConfigError,
    },

    /// Writing the export file failed.
    #[error("export error: {source}")]
    Export {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Serializing the JSON export failed.
    #[error("export serialization error: {source}")]
    ExportSerialization {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
