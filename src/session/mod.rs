//! Realtime session modules.
//!
//! - `client`: websocket transport, command queue, and reconnect handling.
//! - `proto`: wire frames shared with the console service.
//! - `console`: user-facing session that owns the timeline and routes
//!   outbound commands across transports.

/// Websocket connection, lifecycle state, and command sender.
pub mod client;
/// Console session over one connection and the fallback channel.
pub mod console;
/// Session wire frames.
pub mod proto;
