//! Error handling and exit codes.

/// Process exit codes.
pub mod exit_codes {
    /// Generic failure.
    pub const ERROR_GENERIC: i32 = 1;
    /// A requested file could not be opened.
    pub const ERROR_MISSING_FILE: i32 = 2;
    /// A non-growable pool ran out of slots.
    pub const ERROR_EXHAUSTED: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}

/// Errors surfaced by the workbench.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A file could not be opened.
    #[error("cannot open {0}")]
    MissingFile(String),

    /// A non-growable pool refused an allocation.
    #[error("pool exhausted after {0} blocks")]
    PoolExhausted(usize),

    /// Writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Map an error to the process exit code.
pub fn handle_error(err: &AppError) -> i32 {
    match err {
        AppError::Config(_) => exit_codes::ERROR_CONFIG,
        AppError::MissingFile(_) => exit_codes::ERROR_MISSING_FILE,
        AppError::PoolExhausted(_) => exit_codes::ERROR_EXHAUSTED,
        AppError::Io(_) => exit_codes::ERROR_GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(handle_error(&AppError::Config("bad".into())), 4);
        assert_eq!(handle_error(&AppError::MissingFile("a.vs".into())), 2);
        assert_eq!(handle_error(&AppError::PoolExhausted(4)), 3);
        let io = std::io::Error::other("disk full");
        assert_eq!(handle_error(&AppError::Io(io)), 1);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            AppError::PoolExhausted(4).to_string(),
            "pool exhausted after 4 blocks"
        );
        assert_eq!(
            AppError::MissingFile("shader.fs".into()).to_string(),
            "cannot open shader.fs"
        );
    }
}
