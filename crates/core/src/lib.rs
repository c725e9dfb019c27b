//! The turn pipeline: history, request composition, stream decoding,
//! typewriter rendering and finalization.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod compose;
mod decode;
mod error;
pub mod history;
pub mod render;
mod turn;

pub use compose::compose;
pub use decode::decode;
pub use error::Error;
pub use history::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
pub use render::{NoDelay, Pacer, Renderer, TokioPacer};
pub use turn::{
    StreamSummary, Turn, TurnOptions, TurnOutcome, TurnState, run_turn,
};
