use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use stream_chat_model::{ErrorKind, ProviderError};

/// Error type for everything that can end a turn early.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    diagnostic: Vec<String>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostic: Vec::new(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    #[inline]
    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    #[inline]
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub(crate) fn from_provider<E: ProviderError>(err: &E) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            diagnostic: err.diagnostic().to_vec(),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the body lines of a failed response, verbatim.
    #[inline]
    pub fn diagnostic(&self) -> &[String] {
        &self.diagnostic
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.as_str(), self.message)
    }
}

impl StdError for Error {}
