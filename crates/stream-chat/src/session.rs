use std::io::Write;

use stream_chat_core::{
    Error, HistoryStore, Pacer, Renderer, TurnOptions, TurnOutcome, run_turn,
};
use stream_chat_model::ChatProvider;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder<P, S> {
    provider: P,
    store: S,
    options: TurnOptions,
}

impl<P: ChatProvider, S: HistoryStore> SessionBuilder<P, S> {
    /// Creates a session builder with a provider and a history store.
    pub fn with_provider(provider: P, store: S) -> Self {
        Self {
            provider,
            store,
            options: TurnOptions::default(),
        }
    }

    /// Overrides whether reasoning spans are shown.
    ///
    /// The override is stored in the history, so later sessions keep it.
    #[inline]
    pub fn with_show_think(mut self, show_think: bool) -> Self {
        self.options = self.options.with_show_think(show_think);
        self
    }

    /// Overrides the delay between rendered characters.
    ///
    /// The override is stored in the history, so later sessions keep it.
    #[inline]
    pub fn with_typewriter_delay_ms(mut self, delay_ms: u64) -> Self {
        self.options = self.options.with_typewriter_delay_ms(delay_ms);
        self
    }

    /// Attaches a callback to be invoked right before the request is sent.
    #[inline]
    pub fn on_request(
        mut self,
        on_request: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.options = self.options.on_request(on_request);
        self
    }

    /// Attaches a callback to be invoked once the request settles, with
    /// whether the remote service accepted it.
    #[inline]
    pub fn on_response(
        mut self,
        on_response: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.options = self.options.on_response(on_response);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session<P, S> {
        Session {
            provider: self.provider,
            store: self.store,
            options: self.options,
        }
    }
}

/// A chat session bound to one history.
///
/// Each [`Session::ask`] is one turn: the history is loaded, the prompt
/// sent, the answer rendered as it streams in, and the history saved.
pub struct Session<P, S> {
    provider: P,
    store: S,
    options: TurnOptions,
}

impl<P: ChatProvider, S: HistoryStore> Session<P, S> {
    /// Asks `prompt` and renders the answer through `renderer`.
    ///
    /// A request the remote service doesn't accept leaves the history
    /// untouched.
    pub async fn ask<W: Write, A: Pacer>(
        &self,
        prompt: &str,
        renderer: &mut Renderer<W, A>,
    ) -> Result<TurnOutcome, Error> {
        run_turn(&self.provider, &self.store, prompt, renderer, &self.options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stream_chat_core::{MemoryHistoryStore, NoDelay};
    use stream_chat_model::{ErrorKind, Message};
    use stream_chat_test_provider::{PresetResponse, TestProvider};

    use super::*;

    #[tokio::test]
    async fn test_ask_applies_preferences() {
        let provider = TestProvider::with_response(
            PresetResponse::with_answers([("cv1", "<think>hmm</think> Hi")]),
        );
        let store = MemoryHistoryStore::default();
        let session = SessionBuilder::with_provider(provider, store.clone())
            .with_show_think(false)
            .with_typewriter_delay_ms(0)
            .build();

        let mut renderer = Renderer::new(Vec::new(), NoDelay);
        let outcome = session.ask("hello", &mut renderer).await.unwrap();
        assert_eq!(
            outcome.transcript.messages,
            vec![Message::user("hello"), Message::assistant("Hi")]
        );

        let saved = store.transcript().unwrap();
        assert!(!saved.show_think);
        assert_eq!(saved.typewriter_delay_ms, 0);
    }

    #[tokio::test]
    async fn test_callbacks() {
        let provider = TestProvider::default();
        provider.add_response(PresetResponse::with_answers([("cv1", "Hi")]));
        provider.add_response(PresetResponse::with_status(503, ["busy"]));

        let requests = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));
        let store = MemoryHistoryStore::default();
        let session = SessionBuilder::with_provider(provider, store.clone())
            .with_typewriter_delay_ms(0)
            .on_request({
                let requests = Arc::clone(&requests);
                move || {
                    requests.fetch_add(1, Ordering::Relaxed);
                }
            })
            .on_response({
                let accepted = Arc::clone(&accepted);
                move |ok| {
                    if ok {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .build();

        let mut renderer = Renderer::new(Vec::new(), NoDelay);
        session.ask("one", &mut renderer).await.unwrap();
        let err = session.ask("two", &mut renderer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.diagnostic(), ["busy"]);

        assert_eq!(requests.load(Ordering::Relaxed), 2);
        assert_eq!(accepted.load(Ordering::Relaxed), 1);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.transcript().unwrap().messages.len(), 2);
    }
}
