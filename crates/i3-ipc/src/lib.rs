//! Client for the i3 window manager IPC protocol
//!
//! This crate talks to i3 over its Unix domain socket. It enables callers to:
//! - Run commands and query workspaces, outputs, the layout tree, marks, bars,
//!   binding modes, the version and the loaded configuration
//! - Subscribe to events and handle them with per-category callbacks
//! - Broadcast ticks and request sync messages
//!
//! ## Architecture
//!
//! - `message`: frame codec for the binary header and raw JSON payload
//! - `parser`: decoding of JSON payloads into the typed values of `types`
//! - `events`: event categories, callbacks and the client's event queue
//! - `I3Client`: request/reply exchange and ordered event delivery
//! - `I3Error`: error types for IPC operations
//!
//! ## Protocol
//!
//! i3 exposes a Unix socket at `$I3SOCK` (or wherever `i3 --get-socketpath`
//! points). Every message is the magic string `i3-ipc`, a payload length, a
//! message type and a JSON payload. Replies reuse the type of their request,
//! events have the high bit of the type set and may arrive at any time once
//! subscribed, including while a reply is pending.

mod client;
mod error;
pub mod events;
pub mod message;
pub mod parser;
pub mod types;

pub use client::{get_socket_path, I3Client};
pub use error::{ErrorKind, I3Error};
pub use events::{Callback, Event, EventCategory};
pub use message::{Frame, MessageType};
pub use parser::Reply;
pub use types::*;
