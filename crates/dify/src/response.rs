use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use stream_chat_model::{ChatResponse, ErrorKind};

use crate::Error;
use crate::io::{Lines, LinesError, MAX_LINE_LEN};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextLine = (Result<Option<Vec<u8>>, Error>, Lines);

pin_project! {
    /// A streaming answer from the chat messages endpoint.
    pub struct DifyResponse {
        next_line_fut: Option<PinnedFuture<NextLine>>,
    }
}

impl DifyResponse {
    #[inline]
    pub(crate) fn from_lines(lines: Lines) -> Self {
        Self {
            next_line_fut: Some(Box::pin(next_line(lines))),
        }
    }
}

impl ChatResponse for DifyResponse {
    type Error = crate::Error;

    fn poll_next_line(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Vec<u8>>, Self::Error>> {
        let this = self.project();
        let Some(next_line_fut) = this.next_line_fut else {
            return Poll::Ready(Ok(None));
        };
        let (result, lines) = ready!(next_line_fut.as_mut().poll(cx));
        match result {
            Ok(Some(line)) => {
                // The body may still have more lines, create a new future
                // for the next one.
                *this.next_line_fut = Some(Box::pin(next_line(lines)));
                Poll::Ready(Ok(Some(line)))
            }
            Ok(None) => {
                *this.next_line_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_line_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

async fn next_line(mut lines: Lines) -> NextLine {
    let result = lines.next_line().await.map_err(|err| match err {
        LinesError::LineTooLong => Error::new(
            format!("stream line exceeds {MAX_LINE_LEN} bytes"),
            ErrorKind::Transport,
        ),
        LinesError::ChunksError(err) => Error::new(
            format!("failed to read response body: {}", err.0),
            ErrorKind::Transport,
        ),
    });
    if let Ok(Some(line)) = &result {
        trace!("got line: {}", String::from_utf8_lossy(line));
    }
    (result, lines)
}

/// Reads a failure body line by line, keeping each line verbatim.
///
/// A read error ends the collection early; the lines gathered so far are
/// still worth showing.
pub(crate) async fn read_diagnostic(mut lines: Lines) -> Vec<String> {
    let mut diagnostic = Vec::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                diagnostic.push(String::from_utf8_lossy(&line).into_owned());
            }
            Ok(None) => break,
            Err(err) => {
                warn!("stopped reading error body: {err:?}");
                break;
            }
        }
    }
    diagnostic
}
