//! One prompt and its streamed answer, from request to saved history.

use std::future::poll_fn;
use std::io::Write;
use std::pin::pin;

use stream_chat_model::{ChatProvider, ChatResponse, Transcript, TurnRequest};

use crate::history::HistoryStore;
use crate::render::{Pacer, Renderer};
use crate::{Error, compose, decode};

/// Where a [`Turn`] is in its lifecycle.
///
/// Finalizing consumes the turn, so there is no state for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// The request is composed but not sent.
    Idle,
    /// The remote service accepted the request.
    RequestSent,
    /// Lines are being read and rendered.
    Streaming,
    /// The body has ended, or failed to read further.
    StreamEnded,
    /// The request failed before anything was streamed.
    Aborted,
}

/// What happened while consuming a response body.
#[derive(Debug, Default)]
pub struct StreamSummary {
    /// Records decoded successfully.
    pub events: usize,
    /// Lines that failed to decode and were skipped.
    pub skipped_lines: usize,
    /// The read failure that ended the body early, if any.
    pub stream_error: Option<Error>,
}

/// A finished turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The transcript as saved.
    pub transcript: Transcript,
    /// How the response body went.
    pub summary: StreamSummary,
}

/// A single turn of the conversation.
#[derive(Debug)]
pub struct Turn {
    transcript: Transcript,
    request: TurnRequest,
    answer: String,
    state: TurnState,
}

impl Turn {
    /// Starts a turn for `prompt` on top of `transcript`.
    ///
    /// The request is composed from the earlier messages, then the prompt
    /// is appended to the in-memory transcript as the user turn.
    pub fn start(mut transcript: Transcript, prompt: &str) -> Self {
        let request = compose(&transcript, prompt);
        transcript.push_user(prompt);
        Self {
            transcript,
            request,
            answer: String::new(),
            state: TurnState::Idle,
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Returns the composed request.
    #[inline]
    pub fn request(&self) -> &TurnRequest {
        &self.request
    }

    /// Returns the in-memory transcript, including the user turn.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the answer accumulated so far.
    #[inline]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Sends the request.
    ///
    /// On failure the turn is aborted and should be dropped without
    /// finalizing, so the unanswered prompt never reaches the history.
    pub async fn send<P: ChatProvider>(
        &mut self,
        provider: &P,
    ) -> Result<P::Response, Error> {
        match provider.send_request(&self.request).await {
            Ok(resp) => {
                debug!("request accepted");
                self.state = TurnState::RequestSent;
                Ok(resp)
            }
            Err(err) => {
                error!("request failed: {err}");
                self.state = TurnState::Aborted;
                Err(Error::from_provider(&err))
            }
        }
    }

    /// Reads the response to its end, rendering every answer fragment.
    ///
    /// Lines that don't decode are logged and skipped. A failure to read
    /// the body ends the stream; it is reported in the summary and the
    /// fragments received before it are kept.
    pub async fn consume<R, W, P>(
        &mut self,
        resp: R,
        renderer: &mut Renderer<W, P>,
    ) -> StreamSummary
    where
        R: ChatResponse,
        W: Write,
        P: Pacer,
    {
        self.state = TurnState::Streaming;
        let show_think = self.transcript.show_think;
        let delay = self.transcript.typewriter_delay();
        let mut summary = StreamSummary::default();

        let mut resp = pin!(resp);
        loop {
            let line = match poll_fn(|cx| resp.as_mut().poll_next_line(cx)).await
            {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    error!("stream ended early: {err}");
                    summary.stream_error = Some(Error::from_provider(&err));
                    break;
                }
            };

            let event = match decode(&line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    warn!("skipping line: {err}");
                    summary.skipped_lines += 1;
                    continue;
                }
            };
            summary.events += 1;
            trace!("got an event: {:?}", event.event);

            if self
                .transcript
                .latch_conversation_id(event.conversation_id())
            {
                debug!("conversation id: {}", self.transcript.conversation_id);
            }
            if let Some(message) = event.error_message() {
                warn!("remote service reported an error: {message}");
            }

            renderer
                .render(event.answer(), show_think, delay, &mut self.answer)
                .await;
        }

        self.state = TurnState::StreamEnded;
        debug!(
            "stream ended after {} events, {} skipped lines",
            summary.events, summary.skipped_lines
        );
        summary
    }

    /// Records the answer and saves the transcript.
    ///
    /// The assistant turn is appended only if some text was accumulated.
    /// The transcript is saved either way, keeping the user turn and any
    /// newly learned conversation id.
    pub fn finalize<S: HistoryStore>(
        mut self,
        store: &S,
    ) -> Result<Transcript, Error> {
        if !self.answer.is_empty() {
            let answer = std::mem::take(&mut self.answer);
            self.transcript.push_assistant(answer);
        }
        store.save(&self.transcript)?;
        Ok(self.transcript)
    }
}

type RequestHook = Box<dyn Fn() + Send + Sync>;
type ResponseHook = Box<dyn Fn(bool) + Send + Sync>;

/// Per-run settings for [`run_turn`].
///
/// Preference overrides are applied to the loaded transcript before the
/// turn starts, so a successful turn saves them for later runs.
#[derive(Default)]
pub struct TurnOptions {
    show_think: Option<bool>,
    typewriter_delay_ms: Option<u64>,
    on_request: Option<RequestHook>,
    on_response: Option<ResponseHook>,
}

impl TurnOptions {
    /// Overrides whether reasoning spans are shown.
    #[inline]
    pub fn with_show_think(mut self, show_think: bool) -> Self {
        self.show_think = Some(show_think);
        self
    }

    /// Overrides the delay between rendered characters.
    #[inline]
    pub fn with_typewriter_delay_ms(mut self, delay_ms: u64) -> Self {
        self.typewriter_delay_ms = Some(delay_ms);
        self
    }

    /// Attaches a hook invoked right before the request is sent.
    #[inline]
    pub fn on_request(
        mut self,
        on_request: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_request = Some(Box::new(on_request));
        self
    }

    /// Attaches a hook invoked once the request settles, with whether the
    /// remote service accepted it.
    #[inline]
    pub fn on_response(
        mut self,
        on_response: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_response = Some(Box::new(on_response));
        self
    }

    fn apply_preferences(&self, transcript: &mut Transcript) {
        if let Some(show_think) = self.show_think {
            transcript.show_think = show_think;
        }
        if let Some(delay_ms) = self.typewriter_delay_ms {
            transcript.typewriter_delay_ms = delay_ms;
        }
    }
}

impl std::fmt::Debug for TurnOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOptions")
            .field("show_think", &self.show_think)
            .field("typewriter_delay_ms", &self.typewriter_delay_ms)
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

/// Runs a whole turn: load, send, stream, finalize.
///
/// If loading fails or the request is not accepted, nothing is saved.
pub async fn run_turn<P, S, W, A>(
    provider: &P,
    store: &S,
    prompt: &str,
    renderer: &mut Renderer<W, A>,
    options: &TurnOptions,
) -> Result<TurnOutcome, Error>
where
    P: ChatProvider,
    S: HistoryStore,
    W: Write,
    A: Pacer,
{
    let mut transcript = store.load()?;
    options.apply_preferences(&mut transcript);

    let mut turn = Turn::start(transcript, prompt);
    if let Some(on_request) = &options.on_request {
        on_request();
    }
    let resp = turn.send(provider).await;
    if let Some(on_response) = &options.on_response {
        on_response(resp.is_ok());
    }

    let summary = turn.consume(resp?, renderer).await;
    let transcript = turn.finalize(store)?;
    Ok(TurnOutcome {
        transcript,
        summary,
    })
}
