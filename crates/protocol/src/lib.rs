//! jfsnotify Protocol - wire format for the remote filesystem watch service.
//!
//! This crate provides:
//! - [`wrap`] / [`unwrap`] for the 4-byte type-tagged message envelope
//! - [`Event`] records with their fixed 514-byte binary layout
//! - [`Message`] for typed control messages (`WATCH`, `UNWATCH`, ...)
//! - [`resolve`] to turn a target string into a [`DialTarget`]
//! - [`FrameError`] and [`is_transport_error`] for read-loop error handling
//!
//! # Wire Format
//!
//! ```text
//! message: [4 bytes type, big-endian][payload]
//! event:   [255 bytes name][4 bytes op, big-endian][255 bytes key]
//! ```
//!
//! Names and keys are NUL padded. An `EVENT` payload is any number of event
//! records back to back. Length prefixing is left to the stream transport.
//!
//! # Example
//!
//! ```rust
//! use jfsnotify_protocol::{Event, Message, MessageType, Op, unwrap, decode_events};
//!
//! let msg = Message::Event {
//!     events: vec![Event::new("/data/report.txt", Op::WRITE, "docs")],
//! };
//! let bytes = msg.to_bytes().unwrap();
//!
//! let (kind, payload) = unwrap(&bytes).unwrap();
//! assert_eq!(kind, MessageType::Event);
//! assert_eq!(decode_events(payload).unwrap()[0].op, Op::WRITE);
//! ```

mod event;
mod frame;
mod message;
mod target;

// Re-export main types at crate root
pub use event::{Event, FIELD_SIZE, Op, RECORD_SIZE, decode_events, encode_events};
pub use frame::{FrameError, is_transport_error};
pub use message::{Message, MessageType, ProtocolError, TAG_SIZE, unwrap, wrap};
pub use target::{DEFAULT_TARGET, DialTarget, Network, TARGET_ENV_VAR, default_target, resolve};
