use std::fmt;
use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by every fallible transport and protocol operation.
///
/// Errors carry a category, a human-readable message, and optionally the
/// underlying error that triggered them. Equality compares the category
/// only, so callers can branch on what went wrong without matching on
/// message text.
#[derive(Debug)]
pub struct Error {
    kind:    ErrorKind,
    message: String,
    cause:   Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    InvalidAddr,
    Resolve,
    Timeout,
    Closed,
    AddrInUse,
    AddrNotAvail,
    Io,
    Tls,
    Protocol,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { kind, message, cause: None }
    }

    pub fn with_cause<E>(kind: ErrorKind, message: impl Into<String>, cause: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let message = message.into();
        let cause   = Some(cause.into());
        Self { kind, message, cause }
    }

    pub fn closed() -> Self {
        Self::new(ErrorKind::Closed, "connection closed")
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "i/o timeout")
    }

    pub fn invalid_addr() -> Self {
        Self::new(ErrorKind::InvalidAddr, "invalid network address")
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq<ErrorKind> for Error {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind == *other
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut          => Self::timeout(),
            io::ErrorKind::WouldBlock        => Self::timeout(),
            io::ErrorKind::ConnectionReset   => Self::closed(),
            io::ErrorKind::ConnectionAborted => Self::closed(),
            io::ErrorKind::NotConnected      => Self::closed(),
            io::ErrorKind::BrokenPipe        => Self::closed(),
            io::ErrorKind::UnexpectedEof     => Self::closed(),
            io::ErrorKind::AddrInUse         => Self::new(ErrorKind::AddrInUse, "address already in use"),
            io::ErrorKind::AddrNotAvailable  => Self::new(ErrorKind::AddrNotAvail, "cannot assign requested address"),
            _                                => Self::with_cause(ErrorKind::Io, format!("socket error: {}", err), err),
        }
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Self::with_cause(ErrorKind::Tls, format!("tls error: {}", err), err)
    }
}

impl From<nix::Error> for Error {
    fn from(err: nix::Error) -> Self {
        Self::with_cause(ErrorKind::Io, format!("socket error: {}", err), err)
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use super::{Error, ErrorKind};

    #[test]
    fn equality_ignores_message() {
        let a = Error::new(ErrorKind::Timeout, "i/o timeout");
        let b = Error::new(ErrorKind::Timeout, "deadline elapsed");
        let c = Error::closed();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ErrorKind::Timeout);
    }

    #[test]
    fn io_errors_map_to_kinds() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(Error::from(reset).kind(), ErrorKind::Closed);

        let timeout = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(Error::from(timeout).kind(), ErrorKind::Timeout);

        let inuse = io::Error::from(io::ErrorKind::AddrInUse);
        let inuse = Error::from(inuse);
        assert_eq!(inuse.kind(), ErrorKind::AddrInUse);
        assert_eq!(inuse.to_string(), "address already in use");

        let other = io::Error::new(io::ErrorKind::Other, "no buffer space");
        let other = Error::from(other);
        assert_eq!(other.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&other).is_some());
    }

    #[test]
    fn canonical_messages() {
        assert_eq!(Error::closed().to_string(),       "connection closed");
        assert_eq!(Error::timeout().to_string(),      "i/o timeout");
        assert_eq!(Error::invalid_addr().to_string(), "invalid network address");
    }
}
