//! Watch-event records and operation codes.
//!
//! Every event travels as a fixed 514-byte record:
//!
//! ```text
//! ┌────────────────────┬────────────┬────────────────────┐
//! │ name (255B)        │ op (4B BE) │ key (255B)         │
//! │ NUL padded         │            │ NUL padded         │
//! └────────────────────┴────────────┴────────────────────┘
//! ```
//!
//! An `EVENT` message payload is zero or more records back to back, so its
//! length is always a multiple of [`RECORD_SIZE`].

use bitflags::bitflags;
use std::borrow::Cow;
use std::fmt;

use crate::message::ProtocolError;

/// Width of every fixed string field on the wire (names, keys, paths).
pub const FIELD_SIZE: usize = 255;

/// Width of the operation code.
pub const OP_SIZE: usize = 4;

/// Size of one encoded event record.
pub const RECORD_SIZE: usize = FIELD_SIZE + OP_SIZE + FIELD_SIZE;

const OP_OFFSET: usize = FIELD_SIZE;
const KEY_OFFSET: usize = FIELD_SIZE + OP_SIZE;

bitflags! {
    /// Filesystem change kinds carried in an event record.
    ///
    /// Bits outside the named flags are kept as-is so that codes added by
    /// newer peers survive a decode/encode cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Op: u32 {
        /// A file or directory was created.
        const CREATE = 1 << 0;
        /// File contents were written.
        const WRITE = 1 << 1;
        /// A file or directory was removed.
        const REMOVE = 1 << 2;
        /// A file or directory was renamed.
        const RENAME = 1 << 3;
        /// Permissions or other attributes changed.
        const CHMOD = 1 << 4;
    }
}

impl Op {
    /// Parse a single operation name, case-insensitive (`"create"`, `"WRITE"`).
    #[must_use]
    pub fn from_name_ignore_case(name: &str) -> Option<Self> {
        Self::from_name(&name.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }

        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

/// One filesystem change notification.
///
/// `name` and `key` are raw bytes: paths on the watched host need not be
/// valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    /// Opaque identifier chosen by the producer (watcher name or path).
    pub name: Vec<u8>,
    /// What happened.
    pub op: Op,
    /// Opaque correlation token.
    pub key: Vec<u8>,
}

impl Event {
    /// Create a new event.
    #[must_use]
    pub fn new(name: impl Into<Vec<u8>>, op: Op, key: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            op,
            key: key.into(),
        }
    }

    /// `name` as text, if it is valid UTF-8.
    #[must_use]
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    /// `name` as text, with invalid sequences replaced.
    #[must_use]
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// `key` as text, if it is valid UTF-8.
    #[must_use]
    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }

    /// `key` as text, with invalid sequences replaced.
    #[must_use]
    pub fn key_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Encode this event as one fixed-size record.
    ///
    /// Fails with [`ProtocolError::FieldTooLong`] if `name` or `key` does not
    /// fit in [`FIELD_SIZE`] bytes.
    pub fn to_bytes(&self) -> Result<[u8; RECORD_SIZE], ProtocolError> {
        let mut buf = [0u8; RECORD_SIZE];
        put_fixed(&mut buf[..OP_OFFSET], "name", &self.name)?;
        buf[OP_OFFSET..KEY_OFFSET].copy_from_slice(&self.op.bits().to_be_bytes());
        put_fixed(&mut buf[KEY_OFFSET..], "key", &self.key)?;
        Ok(buf)
    }

    /// Decode exactly one record.
    ///
    /// The input must be exactly [`RECORD_SIZE`] bytes: shorter input is a
    /// [`ProtocolError::TruncatedRecord`], longer input is a
    /// [`ProtocolError::MalformedPayloadLength`]. Use [`decode_events`] for a
    /// whole `EVENT` payload.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < RECORD_SIZE {
            return Err(ProtocolError::TruncatedRecord {
                len: buf.len(),
                expected: RECORD_SIZE,
            });
        }
        if buf.len() > RECORD_SIZE {
            return Err(ProtocolError::MalformedPayloadLength {
                len: buf.len(),
                record: RECORD_SIZE,
            });
        }

        let mut op = [0u8; OP_SIZE];
        op.copy_from_slice(&buf[OP_OFFSET..KEY_OFFSET]);

        Ok(Self {
            name: trim_padding(&buf[..OP_OFFSET]).to_vec(),
            op: Op::from_bits_retain(u32::from_be_bytes(op)),
            key: trim_padding(&buf[KEY_OFFSET..]).to_vec(),
        })
    }
}

/// Encode a batch of events as an `EVENT` payload.
pub fn encode_events(events: &[Event]) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(events.len() * RECORD_SIZE);
    for event in events {
        buf.extend_from_slice(&event.to_bytes()?);
    }
    Ok(buf)
}

/// Decode an `EVENT` payload into its records.
///
/// The payload length is checked to be a multiple of [`RECORD_SIZE`] before
/// any record is decoded. An empty payload holds no events.
pub fn decode_events(payload: &[u8]) -> Result<Vec<Event>, ProtocolError> {
    if payload.len() % RECORD_SIZE != 0 {
        return Err(ProtocolError::MalformedPayloadLength {
            len: payload.len(),
            record: RECORD_SIZE,
        });
    }

    payload
        .chunks_exact(RECORD_SIZE)
        .map(Event::from_bytes)
        .collect()
}

/// Write `value` left-anchored into `dst`, leaving the rest zeroed.
pub(crate) fn put_fixed(
    dst: &mut [u8],
    field: &'static str,
    bytes: &[u8],
) -> Result<(), ProtocolError> {
    if bytes.len() > dst.len() {
        return Err(ProtocolError::FieldTooLong {
            field,
            len: bytes.len(),
            max: dst.len(),
        });
    }
    dst[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Strip trailing NUL padding from a fixed field.
pub(crate) fn trim_padding(src: &[u8]) -> &[u8] {
    let end = src.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &src[..end]
}

/// Read a NUL-padded field that must hold text.
pub(crate) fn read_fixed_str(src: &[u8], field: &'static str) -> Result<String, ProtocolError> {
    std::str::from_utf8(trim_padding(src))
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8 { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 514);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = Event::new("/data/photos", Op::CREATE | Op::WRITE, "watcher-1");
        let bytes = event.to_bytes().unwrap();
        assert_eq!(Event::from_bytes(&bytes).unwrap(), event);
    }

    #[test]
    fn test_event_layout() {
        let event = Event::new("abc", Op::RENAME, "k");
        let bytes = event.to_bytes().unwrap();

        assert_eq!(&bytes[0..3], b"abc");
        assert!(bytes[3..255].iter().all(|&b| b == 0));
        assert_eq!(&bytes[255..259], &[0, 0, 0, 8]);
        assert_eq!(bytes[259], b'k');
        assert!(bytes[260..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_padding_is_stripped() {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..3].copy_from_slice(b"abc");
        let event = Event::from_bytes(&bytes).unwrap();
        assert_eq!(event.name, b"abc");
        assert!(event.key.is_empty());
        assert!(event.op.is_empty());
    }

    #[test]
    fn test_trailing_nul_in_value_is_lost() {
        let event = Event::new("name\0", Op::WRITE, "key\0\0");
        let decoded = Event::from_bytes(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.name, b"name");
        assert_eq!(decoded.key, b"key");
    }

    #[test]
    fn test_full_width_fields() {
        let name = "n".repeat(FIELD_SIZE);
        let key = "k".repeat(FIELD_SIZE);
        let event = Event::new(name.clone(), Op::CHMOD, key.clone());
        let decoded = Event::from_bytes(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.name, name.as_bytes());
        assert_eq!(decoded.key, key.as_bytes());
    }

    #[test]
    fn test_field_too_long() {
        let event = Event::new("n".repeat(FIELD_SIZE + 1), Op::CREATE, "k");
        assert!(matches!(
            event.to_bytes(),
            Err(ProtocolError::FieldTooLong {
                field: "name",
                len: 256,
                max: 255
            })
        ));

        let event = Event::new("n", Op::CREATE, "k".repeat(300));
        assert!(matches!(
            event.to_bytes(),
            Err(ProtocolError::FieldTooLong { field: "key", .. })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = [0u8; RECORD_SIZE - 1];
        assert!(matches!(
            Event::from_bytes(&bytes),
            Err(ProtocolError::TruncatedRecord {
                len: 513,
                expected: 514
            })
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let bytes = [0u8; RECORD_SIZE + 1];
        assert!(matches!(
            Event::from_bytes(&bytes),
            Err(ProtocolError::MalformedPayloadLength { len: 515, .. })
        ));
    }

    #[test]
    fn test_decode_non_utf8_fields() {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..3].copy_from_slice(b"/\xffx");
        bytes[KEY_OFFSET] = 0xfe;

        let event = Event::from_bytes(&bytes).unwrap();
        assert_eq!(event.name, b"/\xffx");
        assert_eq!(event.key, [0xfe_u8]);
        assert_eq!(event.name_str(), None);
        assert_eq!(event.name_lossy(), "/\u{fffd}x");
        assert_eq!(event.key_lossy(), "\u{fffd}");
    }

    #[test]
    fn test_batch_keeps_non_utf8_record() {
        let events = vec![
            Event::new("/srv/ok.txt", Op::CREATE, "w"),
            Event::new(b"/\xffx".to_vec(), Op::WRITE, b"k\xff".to_vec()),
        ];
        let payload = encode_events(&events).unwrap();

        let decoded = decode_events(&payload).unwrap();
        assert_eq!(decoded, events);
        assert_eq!(decoded[0].name_str(), Some("/srv/ok.txt"));
        assert_eq!(decoded[1].name, b"/\xffx");
    }

    #[test]
    fn test_unknown_op_bits_survive() {
        let op = Op::from_bits_retain(0x8000_0001);
        let event = Event::new("x", op, "y");
        let decoded = Event::from_bytes(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.op.bits(), 0x8000_0001);
        assert!(decoded.op.contains(Op::CREATE));
    }

    #[test]
    fn test_batch_roundtrip() {
        let events = vec![
            Event::new("/a", Op::CREATE, "1"),
            Event::new("/b", Op::REMOVE, "2"),
            Event::new("/c", Op::WRITE | Op::CHMOD, "3"),
        ];
        let payload = encode_events(&events).unwrap();
        assert_eq!(payload.len(), 3 * RECORD_SIZE);
        assert_eq!(decode_events(&payload).unwrap(), events);
    }

    #[test]
    fn test_batch_empty() {
        assert!(decode_events(&[]).unwrap().is_empty());
        assert!(encode_events(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_batch_rejects_partial_record() {
        let mut payload = encode_events(&[Event::new("/a", Op::CREATE, "1")]).unwrap();
        payload.push(0);
        assert!(matches!(
            decode_events(&payload),
            Err(ProtocolError::MalformedPayloadLength { len: 515, record: 514 })
        ));
    }

    #[test]
    fn test_op_display() {
        assert_eq!((Op::CREATE | Op::WRITE).to_string(), "CREATE|WRITE");
        assert_eq!(Op::empty().to_string(), "NONE");
        assert_eq!(Op::from_bits_retain(0x40 | 0x4).to_string(), "REMOVE|0x40");
    }

    #[test]
    fn test_op_from_name() {
        assert_eq!(Op::from_name_ignore_case("chmod"), Some(Op::CHMOD));
        assert_eq!(Op::from_name_ignore_case(" Rename "), Some(Op::RENAME));
        assert_eq!(Op::from_name_ignore_case("touch"), None);
    }
}
