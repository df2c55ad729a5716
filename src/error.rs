use std::fmt;
use std::io;

/// Errors an export can surface. Layout itself is infallible; failures come
/// from font resolution, image decoding and artifact serialization.
#[derive(Debug)]
pub enum Error {
    /// No usable font metrics for the requested family.
    MeasurementUnavailable(String),
    /// The illustration bytes could not be decoded.
    ImageDecode(String),
    /// PDF or DOCX serialization failed.
    Emitter(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MeasurementUnavailable(msg) => write!(f, "measurement unavailable: {msg}"),
            Error::ImageDecode(msg) => write!(f, "image decode failed: {msg}"),
            Error::Emitter(msg) => write!(f, "emitter failed: {msg}"),
            Error::Io(e) => write!(f, "io error: {e}"),
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

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
