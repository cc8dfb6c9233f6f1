use crate::collector::procfs::ParseError;

/// Error returned by a single telemetry query.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a system file or calling the C library.
    Io(std::io::Error),
    /// A system file had unexpected content.
    Parse(String),
    /// The query is not available on this platform.
    Unsupported(&'static str),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
            CollectError::Unsupported(what) => write!(f, "{} is not supported here", what),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        CollectError::Parse(e.message)
    }
}
