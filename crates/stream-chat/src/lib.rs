//! A command-line chat client that streams answers with a typewriter
//! effect and remembers the conversation between runs.
//!
//! The crate includes a CLI tool for using in the terminal. And you can
//! also use [`Session`] as a library to drive turns from your own host.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod cli;
mod session;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`stream_chat_core`] crate.
pub mod core {
    pub use stream_chat_core::*;
}
