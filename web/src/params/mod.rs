//! Typed request bodies for the HTTP endpoints.
//!
//! Field names follow the camelCase JSON documents the producers send, so
//! every struct here renames its fields on the way in.

pub(crate) mod notification;
pub(crate) mod topic;
