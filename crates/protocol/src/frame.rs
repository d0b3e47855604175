//! Framing-layer errors and their classification.
//!
//! The stream framing layer (length prefixing, buffering) lives outside this
//! crate. It reports failures through [`FrameError`], and connection read
//! loops use [`is_transport_error`] to decide whether a failure is a benign
//! framing condition or a fault that should close the connection.

use std::error::Error as StdError;
use thiserror::Error;

/// Error reported by the stream framing layer.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not enough bytes have arrived to complete the frame yet.
    #[error("frame too short")]
    TooShort,

    /// A fixed-length frame arrived with a different length.
    #[error("unexpected fixed frame length: expected {expected} bytes, got {actual}")]
    UnexpectedFixedLength {
        /// Length the framer was configured for.
        expected: usize,
        /// Length actually observed.
        actual: usize,
    },

    /// The declared length field uses a width the framer cannot handle.
    #[error("unsupported frame length field: {0}")]
    UnsupportedLength(usize),

    /// IO error on the underlying socket.
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether this error is a genuine transport fault.
    ///
    /// Returns `false` for framing conditions (short frame, unexpected fixed
    /// length, unsupported length field) and `true` for socket-level failures.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        match self {
            Self::TooShort | Self::UnexpectedFixedLength { .. } | Self::UnsupportedLength(_) => {
                false
            }
            Self::Io(_) => true,
        }
    }
}

/// Classify an arbitrary error surfaced while reading from a connection.
///
/// Walks the `source()` chain looking for a [`FrameError`] and uses its
/// classification, so wrapping the framing error in other error types does not
/// change the result. Errors that carry no `FrameError` are transport errors.
#[must_use]
pub fn is_transport_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(frame) = e.downcast_ref::<FrameError>() {
            return frame.is_transport_error();
        }
        current = e.source();
    }
    true
}
