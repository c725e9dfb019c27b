//! A chat provider for the Dify chat messages API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use stream_chat_model::{ChatProvider, ErrorKind, ProviderError, TurnRequest};

pub use config::{DEFAULT_ENDPOINT, DifyConfig, DifyConfigBuilder};
pub use io::MAX_LINE_LEN;
use io::{Chunks, Lines};
pub use response::DifyResponse;

/// Error type for [`DifyProvider`].
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

    fn remote(status: StatusCode, diagnostic: Vec<String>) -> Self {
        Self {
            message: format!("request returned status {status}"),
            kind: ErrorKind::Remote,
            diagnostic,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
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

/// Dify chat provider.
#[derive(Clone, Debug)]
pub struct DifyProvider {
    client: Client,
    config: Arc<DifyConfig>,
}

impl DifyProvider {
    /// Creates a new `DifyProvider` with the given configuration.
    #[inline]
    pub fn new(config: DifyConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatProvider for DifyProvider {
    type Error = Error;
    type Response = DifyResponse;

    fn send_request(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(&self.config.endpoint)
            .header(header::AUTHORIZATION, self.config.api_key.bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("request failed: {err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if status != StatusCode::OK {
                let lines = Lines::new(Chunks::from_response(resp));
                let diagnostic = response::read_diagnostic(lines).await;
                return Err(Error::remote(status, diagnostic));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Mime>().ok());
            match content_type {
                Some(m) if m.subtype() == mime::EVENT_STREAM => {}
                Some(m) if m.subtype() == mime::JSON => {}
                other => {
                    // Lines are still decoded one by one, so an unexpected
                    // type only shows up as skipped lines.
                    debug!("unexpected content type: {other:?}");
                }
            }

            // Here we got a successful response.
            let lines = Lines::new(Chunks::from_response(resp));
            Ok(DifyResponse::from_lines(lines))
        }
    }
}
