//! A local scripted chat provider for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use stream_chat_model::{
    ChatProvider, ChatResponse, ErrorKind, ProviderError, TurnRequest,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    diagnostic: Vec<String>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            diagnostic: Vec::new(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn diagnostic(&self) -> &[String] {
        &self.diagnostic
    }
}

pub struct TestResponse {
    lines: VecDeque<PresetLine>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    done: bool,
}

impl ChatResponse for TestResponse {
    type Error = crate::Error;

    fn poll_next_line(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Vec<u8>>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if this.done {
            return Poll::Ready(Ok(None));
        }

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            return match this.lines.pop_front() {
                Some(PresetLine::Raw(line)) => {
                    Poll::Ready(Ok(Some(line.into_bytes())))
                }
                Some(PresetLine::Broken) => {
                    this.done = true;
                    Poll::Ready(Err(Error::new(
                        "connection reset",
                        ErrorKind::Transport,
                    )))
                }
                None => {
                    this.done = true;
                    Poll::Ready(Ok(None))
                }
            };
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_line(cx)
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<TurnRequest>,
}

/// A local scripted provider for testing purpose.
///
/// Before sending requests, queue the responses with
/// [`TestProvider::add_response`]. Each request takes the next queued
/// response; if none is left, the request fails with a transport error.
/// Every request is recorded and can be inspected with
/// [`TestProvider::requests`].
#[derive(Clone, Default)]
pub struct TestProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl Debug for TestProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestProvider")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl TestProvider {
    /// Creates a provider that answers the first request with `preset`.
    #[inline]
    pub fn with_response(preset: PresetResponse) -> Self {
        let provider = Self::default();
        provider.add_response(preset);
        provider
    }

    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.lock().responses.push_back(preset);
    }

    /// Sets the delay before each line is delivered.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatProvider for TestProvider {
    type Error = crate::Error;
    type Response = TestResponse;

    fn send_request(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock();
        script.requests.push(req.clone());
        let result = match script.responses.pop_front() {
            Some(PresetResponse::Stream { lines }) => Ok(TestResponse {
                lines: lines.into(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
                done: false,
            }),
            Some(PresetResponse::Remote { status, body }) => Err(Error {
                message: format!("request returned status {status}"),
                kind: ErrorKind::Remote,
                diagnostic: body,
            }),
            Some(PresetResponse::Transport) => {
                Err(Error::new("connection refused", ErrorKind::Transport))
            }
            None => Err(Error::new("no preset response", ErrorKind::Transport)),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use stream_chat_model::Message;

    use super::*;

    async fn collect_lines(resp: TestResponse) -> (Vec<String>, Option<Error>) {
        let mut resp = pin!(resp);
        let mut lines = Vec::new();
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_line(cx)).await {
                Ok(Some(line)) => lines.push(String::from_utf8(line).unwrap()),
                Ok(None) => return (lines, None),
                Err(err) => return (lines, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let provider = TestProvider::default();
        provider.add_response(PresetResponse::with_lines(["a", "b"]));
        provider.add_response(
            PresetResponse::with_lines(["c"]).then_broken(),
        );

        let req = TurnRequest {
            history: vec![Message::user("Hi")],
            query: "Again".to_owned(),
            conversation_id: "cv1".to_owned(),
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (lines, err) = collect_lines(resp).await;
        assert_eq!(lines, vec!["a", "b"]);
        assert!(err.is_none());

        let resp = provider.send_request(&req).await.unwrap();
        let (lines, err) = collect_lines(resp).await;
        assert_eq!(lines, vec!["c"]);
        assert_eq!(err.unwrap().kind(), ErrorKind::Transport);

        assert_eq!(provider.requests(), vec![req.clone(), req]);
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = TestProvider::with_response(PresetResponse::with_status(
            401,
            ["{\"code\": \"unauthorized\"}"],
        ));
        let err = provider
            .send_request(&TurnRequest::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.diagnostic(), ["{\"code\": \"unauthorized\"}"]);

        // The script is exhausted.
        let err = provider
            .send_request(&TurnRequest::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
