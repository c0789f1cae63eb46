//! Client SDK for a remote agent-console service.
//!
//! The crate is organized by transport surface:
//! - `session`: realtime websocket client, wire frames, and the user-facing
//!   console session.
//! - `task_api`: HTTP client for one-shot task execution, used as the
//!   fallback channel when the realtime session is unavailable.
//! - `timeline`: append-only conversation log observed by the presentation
//!   layer.
//! - `reconnect`: redial pacing shared by the session worker.

/// Redial pacing policy for the session worker.
pub mod reconnect;
/// Realtime session client, protocol frames, and the console session.
pub mod session;
/// Task execution API client used as the fallback request channel.
pub mod task_api;
/// Append-only conversation timeline.
pub mod timeline;
