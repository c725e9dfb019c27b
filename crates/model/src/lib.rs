//! Data types shared by every part of the chat client.
//!
//! This crate defines the persisted transcript, the events decoded from
//! a streaming answer, and the seam between the turn pipeline and the
//! remote service that produces those events.
//!
//! Types in this crate don't perform any I/O. Loading, rendering and
//! transport live in their own crates and only agree on the shapes
//! defined here.

#![deny(missing_docs)]

mod error;
mod event;
mod provider;
mod request;
mod response;
mod transcript;

pub use error::*;
pub use event::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use transcript::*;
