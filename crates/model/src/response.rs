use std::pin::Pin;
use std::task::{self, Poll};

use crate::provider::ProviderError;

/// A streaming response body made of newline-delimited records.
pub trait ChatResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Attempts to pull out the next line from the response body.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next line. Implementations will ensure that the current
    ///   task will be notified when the next line may be ready.
    /// - `Poll::Ready(Ok(Some(line)))` means the response has a line to
    ///   deliver, without its line terminator, and may produce further
    ///   lines on subsequent `poll_next_line` calls.
    /// - `Poll::Ready(Ok(None))` means the body has ended.
    /// - `Poll::Ready(Err(error))` means reading the body failed. The
    ///   response should not be polled again.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_line(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<Vec<u8>>, Self::Error>>;
}
