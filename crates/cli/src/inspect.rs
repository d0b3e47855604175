//! Human-readable rendering of raw protocol messages.

use color_eyre::eyre::{Result, bail};
use jfsnotify_protocol::{Message, MessageType, ProtocolError, unwrap};

/// Encode bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string, ignoring whitespace.
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_digit(pair[0])?;
            let lo = hex_digit(pair[1])?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn hex_digit(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => bail!("invalid hex digit {:?}", c as char),
    }
}

/// Describe a full message (type tag and payload).
pub fn describe(data: &[u8]) -> Result<String, ProtocolError> {
    let (kind, payload) = unwrap(data)?;

    let mut lines = vec![
        format!("type: {kind} ({})", kind.code()),
        format!("payload: {} bytes", payload.len()),
    ];

    if !matches!(kind, MessageType::Unknown(_)) {
        match Message::from_parts(kind, payload)? {
            Message::Error { message } => lines.push(format!("message: {message}")),
            Message::Watch { watcher, paths } | Message::Unwatch { watcher, paths } => {
                lines.push(format!("watcher: {watcher}"));
                lines.extend(paths.iter().map(|path| format!("path: {path}")));
            }
            Message::Clear { watcher }
            | Message::Suspend { watcher }
            | Message::Resume { watcher } => lines.push(format!("watcher: {watcher}")),
            Message::Event { events } => {
                lines.push(format!("events: {}", events.len()));
                lines.extend(events.iter().map(|event| {
                    format!(
                        "  {} op={} key={}",
                        event.name_lossy(),
                        event.op,
                        event.key_lossy()
                    )
                }));
            }
        }
    }

    lines.push(String::new());
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jfsnotify_protocol::{Event, Op, wrap};

    #[test]
    fn test_hex_roundtrip() {
        let bytes = [0x00, 0x01, 0xab, 0xff];
        assert_eq!(to_hex(&bytes), "0001abff");
        assert_eq!(from_hex("00 01 AB ff\n").unwrap(), bytes);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(from_hex("abc").is_err());
        assert!(from_hex("zz").is_err());
    }

    #[test]
    fn test_describe_event() {
        let bytes = Message::Event {
            events: vec![Event::new("/data/a.txt", Op::CREATE | Op::WRITE, "docs")],
        }
        .to_bytes()
        .unwrap();

        let text = describe(&bytes).unwrap();
        assert!(text.starts_with("type: event (6)\npayload: 514 bytes\n"));
        assert!(text.contains("events: 1"));
        assert!(text.contains("/data/a.txt op=CREATE|WRITE key=docs"));
    }

    #[test]
    fn test_describe_non_utf8_event() {
        let bytes = Message::Event {
            events: vec![Event::new(b"/\xffx".to_vec(), Op::REMOVE, "w")],
        }
        .to_bytes()
        .unwrap();

        let text = describe(&bytes).unwrap();
        assert!(text.contains("/\u{fffd}x op=REMOVE key=w"));
    }

    #[test]
    fn test_describe_watch() {
        let bytes = Message::Watch {
            watcher: "photos".into(),
            paths: vec!["/data/a".into()],
        }
        .to_bytes()
        .unwrap();

        let text = describe(&bytes).unwrap();
        assert!(text.contains("type: watch (1)"));
        assert!(text.contains("watcher: photos\npath: /data/a\n"));
    }

    #[test]
    fn test_describe_unknown_type() {
        let text = describe(&wrap(MessageType::Unknown(99), b"xyz")).unwrap();
        assert_eq!(text, "type: unknown(99) (99)\npayload: 3 bytes\n");
    }

    #[test]
    fn test_describe_errors() {
        assert!(matches!(
            describe(&[0, 0]),
            Err(ProtocolError::InvalidMessage(_))
        ));
        assert!(matches!(
            describe(&wrap(MessageType::Event, &[0u8; 10])),
            Err(ProtocolError::MalformedPayloadLength { len: 10, .. })
        ));
    }
}
