//! Crate-level error types
//!
//! Errors that terminate a connection or the server itself. Per-frame
//! rejection is not represented here; see [`crate::protocol::FrameError`].

/// Convenience result type for server and connection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for connection and server operations
#[derive(Debug)]
pub enum Error {
    /// Underlying socket or file I/O failure
    Io(std::io::Error),
    /// No complete frame arrived within the configured read deadline
    ReadTimeout,
    /// The accumulated frame exceeded the configured size limit without
    /// a terminating newline
    FrameTooLarge {
        /// Bytes accumulated so far
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::ReadTimeout => write!(f, "read timed out waiting for a complete frame"),
            Error::FrameTooLarge { size, limit } => {
                write!(f, "frame too large: {} bytes (limit {})", size, limit)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::ReadTimeout;
        assert!(err.to_string().contains("timed out"));

        let err = Error::FrameTooLarge {
            size: 2048,
            limit: 1024,
        };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::from(io);
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("reset"));
    }
}
