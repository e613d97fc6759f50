//! Server-Sent Events (SSE) infrastructure for live notification delivery.
//!
//! This crate owns the Connection Registry: the process-local map of
//! subscribers that currently hold an open event stream.
//!
//! # Architecture
//!
//! - **Single connection per subscriber**: A second connect attempt while one is
//!   open is a no-op; the existing stream is left untouched.
//! - **Explicit instance**: The registry is created once at startup and cloned
//!   into the SSE endpoint and the dispatcher. There is no global state.
//! - **Narrow connection contract**: Registry and dispatcher only see
//!   `LiveConnection` (write a frame, observe close), never axum types.
//! - **Ephemeral**: Nothing is persisted. Connections disappear when the remote
//!   side closes the stream or the process stops.
//!
//! # Message Flow
//!
//! 1. Subscriber opens `/sse/{subscriber_id}`
//! 2. `Manager` checks the subscriber exists through its `SubscriberDirectory`
//! 3. The channel-backed connection is registered, a close observer is attached
//!    and the handshake frame is written
//! 4. The dispatcher takes a `lookup_all` snapshot and writes frames to the
//!    subscribers it targets
//! 5. When the stream is dropped the close observer removes the entry
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, LiveConnection and the channel-backed implementation
//! - `frame`: The `data:` frame written to streams
//! - `manager`: Registration entry point guarded by subscriber existence

pub mod connection;
pub mod error;
pub mod frame;
pub mod manager;

pub use connection::{
    ChannelConnection, ConnectionId, ConnectionRegistry, LiveConnection, Registration,
    SubscriberId,
};
pub use frame::Frame;
pub use manager::{Manager, SubscriberDirectory};
