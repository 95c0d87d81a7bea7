//! Error types

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error on a socket or stream
    Io(io::Error),
    /// None of the configured listeners could be bound
    NoListeners(Vec<BindError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::NoListeners(errors) => {
                write!(f, "No listener could be bound")?;
                for e in errors {
                    write!(f, "; {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::NoListeners(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Failure to bind one listening address
///
/// Fatal for that address only; other listeners keep running. Collected in
/// `ServerHandle::bind_errors` and in `Error::NoListeners`.
#[derive(Debug)]
pub struct BindError {
    /// Address that could not be bound
    pub addr: SocketAddr,
    /// Underlying OS error
    pub source: io::Error,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to bind {}: {}", self.addr, self.source)
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_listeners_display_lists_each_failure() {
        let err = Error::NoListeners(vec![
            BindError {
                addr: "127.0.0.1:9000".parse().unwrap(),
                source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
            },
            BindError {
                addr: "127.0.0.1:9001".parse().unwrap(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
        ]);

        let text = err.to_string();
        assert!(text.contains("127.0.0.1:9000"));
        assert!(text.contains("127.0.0.1:9001"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
