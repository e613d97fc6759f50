//! SSE HTTP handler for the web layer.
//!
//! Only the Axum handler lives here. The connection registry and the frame
//! type live in the `sse` crate so the dispatcher can share them.

pub mod handler;
