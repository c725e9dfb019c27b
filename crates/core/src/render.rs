//! Typewriter rendering of answer fragments.

use std::io::Write;
use std::time::Duration;

/// The marker that opens a reasoning span.
pub const THINK_OPEN: &str = "<think>";

/// The marker that closes a reasoning span.
pub const THINK_CLOSE: &str = "</think>";

/// Removes a leading reasoning span from a fragment.
///
/// With `show_think` off, the first close marker in the fragment must
/// come after the first open marker. Then the result is the text after
/// that close marker with surrounding whitespace trimmed. Anything else,
/// including a stray close marker ahead of the open marker, comes back
/// unchanged.
///
/// Each fragment is looked at on its own: a span whose markers arrive in
/// different fragments is not detected.
pub fn strip_reasoning(fragment: &str, show_think: bool) -> &str {
    if show_think {
        return fragment;
    }
    let Some(open_idx) = fragment.find(THINK_OPEN) else {
        return fragment;
    };
    let Some(close_idx) = fragment.find(THINK_CLOSE) else {
        return fragment;
    };
    if close_idx < open_idx + THINK_OPEN.len() {
        return fragment;
    }
    fragment[close_idx + THINK_CLOSE.len()..].trim()
}

/// Decides how rendering waits between characters.
pub trait Pacer {
    /// Waits for `delay` before the next character.
    fn pause(&mut self, delay: Duration) -> impl Future<Output = ()>;
}

/// Waits on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Never waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    async fn pause(&mut self, _delay: Duration) {}
}

/// Writes answer fragments to a sink one character at a time.
#[derive(Debug)]
pub struct Renderer<W, P> {
    out: W,
    pacer: P,
    sink_failed: bool,
}

impl<W: Write, P: Pacer> Renderer<W, P> {
    /// Creates a renderer writing to `out`, paced by `pacer`.
    #[inline]
    pub fn new(out: W, pacer: P) -> Self {
        Self {
            out,
            pacer,
            sink_failed: false,
        }
    }

    /// Renders a fragment and appends what was rendered to `accumulator`.
    ///
    /// The accumulated text is the reasoning-stripped one, so a span
    /// hidden from the screen never reaches the history either. Empty
    /// fragments are ignored.
    ///
    /// A failing sink is reported once; the text is still accumulated.
    pub async fn render(
        &mut self,
        fragment: &str,
        show_think: bool,
        delay: Duration,
        accumulator: &mut String,
    ) {
        if fragment.is_empty() {
            return;
        }
        let text = strip_reasoning(fragment, show_think);

        for ch in text.chars() {
            if self.sink_failed {
                break;
            }
            if let Err(err) = self.write_char(ch) {
                warn!("failed to write answer: {err}");
                self.sink_failed = true;
                break;
            }
            if !delay.is_zero() {
                self.pacer.pause(delay).await;
            }
        }

        accumulator.push_str(text);
    }

    /// Consumes the renderer, returning the sink.
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_char(&mut self, ch: char) -> std::io::Result<()> {
        let mut buf = [0u8; 4];
        self.out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use tokio::time::Instant;

    use super::*;

    #[derive(Default)]
    struct CountingPacer(Vec<Duration>);

    impl Pacer for CountingPacer {
        async fn pause(&mut self, delay: Duration) {
            self.0.push(delay);
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_strip_reasoning() {
        let fragment = "<think>reasoning</think>  final text";
        assert_eq!(strip_reasoning(fragment, false), "final text");
        assert_eq!(strip_reasoning(fragment, true), fragment);

        let fragment = "<think>\nstep 1\nstep 2\n</think>\n\nAnswer\n";
        assert_eq!(strip_reasoning(fragment, false), "Answer");
    }

    #[test]
    fn test_malformed_markers_pass_through() {
        for fragment in [
            "<think>still thinking",
            "done</think> answer",
            "</think> out of order <think>",
            "done</think> <think>plan</think> answer",
            "plain text",
        ] {
            assert_eq!(strip_reasoning(fragment, false), fragment);
            assert_eq!(strip_reasoning(fragment, true), fragment);
        }
    }

    #[tokio::test]
    async fn test_render_paces_each_char() {
        let mut renderer = Renderer::new(Vec::new(), CountingPacer::default());
        let mut acc = String::new();
        renderer
            .render("héllo", true, Duration::from_millis(5), &mut acc)
            .await;
        renderer.render("", true, Duration::from_millis(5), &mut acc).await;
        assert_eq!(acc, "héllo");
        assert_eq!(renderer.pacer.0, vec![Duration::from_millis(5); 5]);
        assert_eq!(renderer.into_inner(), "héllo".as_bytes());
    }

    #[tokio::test]
    async fn test_render_strips_before_accumulating() {
        let mut renderer = Renderer::new(Vec::new(), NoDelay);
        let mut acc = String::from("Hi. ");
        renderer
            .render(
                "<think>plan</think> Sure.",
                false,
                Duration::ZERO,
                &mut acc,
            )
            .await;
        assert_eq!(acc, "Hi. Sure.");
        assert_eq!(renderer.into_inner(), b"Sure.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_delay() {
        let mut renderer = Renderer::new(Vec::new(), TokioPacer);
        let mut acc = String::new();
        let started = Instant::now();
        renderer
            .render("abcd", true, Duration::from_millis(50), &mut acc)
            .await;
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_broken_sink_still_accumulates() {
        let mut renderer = Renderer::new(BrokenSink, CountingPacer::default());
        let mut acc = String::new();
        renderer
            .render("one", true, Duration::from_millis(1), &mut acc)
            .await;
        renderer
            .render(" two", true, Duration::from_millis(1), &mut acc)
            .await;
        assert_eq!(acc, "one two");
        assert!(renderer.pacer.0.is_empty());
    }
}
