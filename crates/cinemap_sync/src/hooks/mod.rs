//! The specialized sync hooks
//!
//! Each file adds one concern's outgoing `sync_*` calls, `on_*` registration
//! and inbound handling to [`crate::SyncSession`].

pub mod aspect;
mod camera;
mod filter;
mod landmark;
mod route;

pub use aspect::AspectStatus;
