//! Message envelope and typed control messages.
//!
//! Every message on the wire is a 4-byte big-endian type tag followed by an
//! opaque payload. Stream framing (length prefixes) is applied around the
//! result of [`wrap`] by the transport layer.

use thiserror::Error;

use crate::event::{self, Event, FIELD_SIZE};
use crate::frame::FrameError;

/// Size of the type tag at the start of every message.
pub const TAG_SIZE: usize = 4;

/// Error type for protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Invalid message received.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Input is shorter than one record.
    #[error("truncated record: got {len} bytes, need {expected}")]
    TruncatedRecord { len: usize, expected: usize },

    /// Payload length is not a whole number of records.
    #[error("malformed payload length {len}: not a multiple of {record}")]
    MalformedPayloadLength { len: usize, record: usize },

    /// A string does not fit its fixed-width field.
    #[error("{field} is {len} bytes, max {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A control-message field is not valid UTF-8.
    #[error("{field} is not valid utf-8")]
    InvalidUtf8 { field: &'static str },

    /// Type tag has no typed representation.
    #[error("unknown message type {0}")]
    UnknownMessageType(u32),

    /// Error reported by the stream framing layer.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Error,
    Watch,
    Unwatch,
    Clear,
    Suspend,
    Resume,
    Event,
    /// A code this version does not know; the raw value is preserved.
    Unknown(u32),
}

impl MessageType {
    /// Wire code of this type.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Error => 0,
            Self::Watch => 1,
            Self::Unwatch => 2,
            Self::Clear => 3,
            Self::Suspend => 4,
            Self::Resume => 5,
            Self::Event => 6,
            Self::Unknown(code) => code,
        }
    }

    /// Lowercase name, `unknown` for unrecognised codes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Watch => "watch",
            Self::Unwatch => "unwatch",
            Self::Clear => "clear",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Event => "event",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u32> for MessageType {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Error,
            1 => Self::Watch,
            2 => Self::Unwatch,
            3 => Self::Clear,
            4 => Self::Suspend,
            5 => Self::Resume,
            6 => Self::Event,
            other => Self::Unknown(other),
        }
    }
}

impl From<MessageType> for u32 {
    fn from(kind: MessageType) -> Self {
        kind.code()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({code})"),
            known => f.write_str(known.name()),
        }
    }
}

/// Prefix `payload` with the type tag.
#[must_use]
pub fn wrap(kind: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(TAG_SIZE + payload.len());
    buf.extend_from_slice(&kind.code().to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Split a message into its type tag and payload.
///
/// The payload borrows from `data`; it is empty when `data` is exactly the tag.
pub fn unwrap(data: &[u8]) -> Result<(MessageType, &[u8]), ProtocolError> {
    let Some((tag, payload)) = data.split_first_chunk::<TAG_SIZE>() else {
        return Err(ProtocolError::InvalidMessage(format!(
            "{} bytes is shorter than the {TAG_SIZE}-byte type tag",
            data.len()
        )));
    };
    Ok((MessageType::from(u32::from_be_bytes(*tag)), payload))
}

/// A fully decoded message.
///
/// Control payloads use the fixed-width layout of event records: a watcher
/// name padded to [`FIELD_SIZE`] bytes, followed for `Watch`/`Unwatch` by one
/// padded field per path. `Error` carries plain UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Error report from the peer.
    Error { message: String },

    /// Start watching paths under a watcher.
    Watch { watcher: String, paths: Vec<String> },

    /// Stop watching paths under a watcher.
    Unwatch { watcher: String, paths: Vec<String> },

    /// Drop every path of a watcher.
    Clear { watcher: String },

    /// Pause event delivery for a watcher.
    Suspend { watcher: String },

    /// Resume event delivery for a watcher.
    Resume { watcher: String },

    /// Batch of change notifications.
    Event { events: Vec<Event> },
}

impl Message {
    /// Create an error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Type tag this message is sent with.
    #[must_use]
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Error { .. } => MessageType::Error,
            Self::Watch { .. } => MessageType::Watch,
            Self::Unwatch { .. } => MessageType::Unwatch,
            Self::Clear { .. } => MessageType::Clear,
            Self::Suspend { .. } => MessageType::Suspend,
            Self::Resume { .. } => MessageType::Resume,
            Self::Event { .. } => MessageType::Event,
        }
    }

    /// Encode the payload only, without the type tag.
    pub fn payload(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Error { message } => Ok(message.as_bytes().to_vec()),
            Self::Watch { watcher, paths } | Self::Unwatch { watcher, paths } => {
                let mut buf = vec![0u8; FIELD_SIZE * (1 + paths.len())];
                let (head, rest) = buf.split_at_mut(FIELD_SIZE);
                event::put_fixed(head, "watcher", watcher.as_bytes())?;
                for (slot, path) in rest.chunks_exact_mut(FIELD_SIZE).zip(paths) {
                    event::put_fixed(slot, "path", path.as_bytes())?;
                }
                Ok(buf)
            }
            Self::Clear { watcher } | Self::Suspend { watcher } | Self::Resume { watcher } => {
                let mut buf = vec![0u8; FIELD_SIZE];
                event::put_fixed(&mut buf, "watcher", watcher.as_bytes())?;
                Ok(buf)
            }
            Self::Event { events } => event::encode_events(events),
        }
    }

    /// Encode the full message (type tag and payload).
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(wrap(self.kind(), &self.payload()?))
    }

    /// Decode a full message.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        let (kind, payload) = unwrap(data)?;
        Self::from_parts(kind, payload)
    }

    /// Decode a payload whose type tag has already been read.
    pub fn from_parts(kind: MessageType, payload: &[u8]) -> Result<Self, ProtocolError> {
        match kind {
            MessageType::Error => {
                let message = std::str::from_utf8(payload)
                    .map_err(|_| ProtocolError::InvalidUtf8 { field: "message" })?;
                Ok(Self::error(message))
            }
            MessageType::Watch | MessageType::Unwatch => {
                let (watcher, paths) = read_watch_payload(payload)?;
                if kind == MessageType::Watch {
                    Ok(Self::Watch { watcher, paths })
                } else {
                    Ok(Self::Unwatch { watcher, paths })
                }
            }
            MessageType::Clear | MessageType::Suspend | MessageType::Resume => {
                if payload.len() != FIELD_SIZE {
                    return Err(ProtocolError::MalformedPayloadLength {
                        len: payload.len(),
                        record: FIELD_SIZE,
                    });
                }
                let watcher = event::read_fixed_str(payload, "watcher")?;
                Ok(match kind {
                    MessageType::Clear => Self::Clear { watcher },
                    MessageType::Suspend => Self::Suspend { watcher },
                    _ => Self::Resume { watcher },
                })
            }
            MessageType::Event => Ok(Self::Event {
                events: event::decode_events(payload)?,
            }),
            MessageType::Unknown(code) => Err(ProtocolError::UnknownMessageType(code)),
        }
    }
}

/// Split a watch/unwatch payload into the watcher name and path list.
fn read_watch_payload(payload: &[u8]) -> Result<(String, Vec<String>), ProtocolError> {
    if payload.len() < FIELD_SIZE {
        return Err(ProtocolError::TruncatedRecord {
            len: payload.len(),
            expected: FIELD_SIZE,
        });
    }
    if payload.len() % FIELD_SIZE != 0 {
        return Err(ProtocolError::MalformedPayloadLength {
            len: payload.len(),
            record: FIELD_SIZE,
        });
    }

    let (head, rest) = payload.split_at(FIELD_SIZE);
    let watcher = event::read_fixed_str(head, "watcher")?;
    let paths = rest
        .chunks_exact(FIELD_SIZE)
        .map(|field| event::read_fixed_str(field, "path"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((watcher, paths))
}
