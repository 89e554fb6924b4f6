//! Common error types for Frame tools

use thiserror::Error;

/// Common result type for Frame operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Frame tools
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.to_string(), "IO error: gone");
        assert_eq!(
            Error::Config("bad level".to_string()).to_string(),
            "Configuration error: bad level"
        );
        assert_eq!(
            Error::InvalidInput("soundex".to_string()).to_string(),
            "Invalid input: soundex"
        );
    }
}
