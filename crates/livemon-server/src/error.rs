//! Error types for the live monitor binary.

/// Top-level error for the live monitor binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: livemon_core::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: livemon_api::ServerError,
    },

    /// The dedicated `WebSocket` listener failed to start.
    #[error("websocket listener error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: livemon_api::StartupError,
    },
}
