/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required configuration or the prompt is missing.
    Config,
    /// The history could not be read or written.
    Storage,
    /// The request could not be sent, or the connection failed.
    Transport,
    /// The remote service answered with a non-success status.
    Remote,
    /// A stream line is not a valid event.
    Decode,
}

impl ErrorKind {
    /// Returns a short lowercase label for this kind.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Storage => "storage",
            ErrorKind::Transport => "transport",
            ErrorKind::Remote => "remote",
            ErrorKind::Decode => "decode",
        }
    }
}
