//! Inbound frame classification and decoding.
//!
//! [`decode_frame`] accepts bytes of unknown provenance and always returns a
//! renderable [`DecodedMessage`]; malformed input becomes
//! [`DecodedMessage::Error`] instead of an `Err`.

use nom::{
    bytes::complete::take,
    number::complete::{be_u16, be_u8},
    IResult, Parser,
};
use tracing::debug;

use crate::error::DecodeError;
use crate::protocol::descriptor::{group_name, Descriptor, SpecialMeaning};
use crate::protocol::payload::DecodedPayload;
use crate::protocol::text::{byte_list, printable_guess};
use crate::protocol::{command_name, offset, CommandKey, ACK_HEADER, DATA_HEADER};

/// Shortest buffer worth classifying at all.
pub const MIN_FRAME_LEN: usize = 5;
/// Header plus length fields of a data frame.
pub const DATA_HEADER_LEN: usize = offset::PAYLOAD;

/// Bytes shown when rendering an unrecognized buffer.
const UNKNOWN_PREVIEW_LEN: usize = 10;

/// Frame type announced by the header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Ack,
    Unrecognized,
}

impl FrameKind {
    pub fn from_header(header: u8) -> Self {
        match header {
            DATA_HEADER => FrameKind::Data,
            ACK_HEADER => FrameKind::Ack,
            _ => FrameKind::Unrecognized,
        }
    }

    pub fn is_protocol(&self) -> bool {
        !matches!(self, FrameKind::Unrecognized)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedMessage {
    Ack {
        group: u8,
        command: u8,
        name: String,
        special_meaning: Option<SpecialMeaning>,
    },
    Data {
        group: u8,
        command: u8,
        name: String,
        payload: DecodedPayload,
    },
    Unknown {
        header: u8,
        raw: Vec<u8>,
        text_guess: Option<String>,
    },
    Error {
        kind: DecodeError,
        raw: Vec<u8>,
    },
}

impl DecodedMessage {
    /// Command this message refers to, for acks and data frames.
    pub fn key(&self) -> Option<CommandKey> {
        match self {
            DecodedMessage::Ack { group, command, .. }
            | DecodedMessage::Data { group, command, .. } => {
                Some(CommandKey::new(*group, *command))
            }
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DecodedMessage::Error { .. })
    }
}

impl std::fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodedMessage::Ack {
                name,
                special_meaning,
                ..
            } => {
                write!(f, "ACK: {name}")?;
                if let Some(meaning) = special_meaning {
                    write!(f, " ({})", meaning.label())?;
                }
                Ok(())
            }
            DecodedMessage::Data { name, payload, .. } => {
                write!(f, "Data: {name}")?;
                let empty_raw =
                    matches!(payload, DecodedPayload::RawHex { bytes } if bytes.is_empty());
                let detail = payload.to_string();
                if !empty_raw && !detail.is_empty() {
                    write!(f, " - {detail}")?;
                }
                Ok(())
            }
            DecodedMessage::Unknown {
                header,
                raw,
                text_guess,
            } => {
                write!(
                    f,
                    "Unknown (0x{header:02x}): {}",
                    byte_list(raw, UNKNOWN_PREVIEW_LEN)
                )?;
                if let Some(text) = text_guess {
                    write!(f, " \"{text}\"")?;
                }
                Ok(())
            }
            DecodedMessage::Error { kind, .. } => write!(f, "Invalid message: {kind}"),
        }
    }
}

/// Borrowed view of a syntactically valid data frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataFrame<'a> {
    pub full_len: u16,
    pub group: u8,
    pub command: u8,
    pub payload: &'a [u8],
}

/// Header fields of an acknowledgement frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckFrame {
    pub full_len: u16,
    pub group: u8,
    pub command: u8,
}

fn byte(input: &[u8]) -> IResult<&[u8], u8> {
    be_u8(input)
}

fn word16(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

fn take_bytes(input: &[u8], n: usize) -> IResult<&[u8], &[u8]> {
    take(n).parse(input)
}

fn ack_header(input: &[u8]) -> IResult<&[u8], AckFrame> {
    let (input, _header) = byte(input)?;
    let (input, full_len) = word16(input)?;
    let (input, group) = byte(input)?;
    let (input, command) = byte(input)?;
    Ok((
        input,
        AckFrame {
            full_len,
            group,
            command,
        },
    ))
}

fn data_header(input: &[u8]) -> IResult<&[u8], (u16, u8, u8, u16)> {
    let (input, _header) = byte(input)?;
    let (input, full_len) = word16(input)?;
    let (input, group) = byte(input)?;
    let (input, _delimiter) = byte(input)?;
    let (input, command) = byte(input)?;
    let (input, payload_len) = word16(input)?;
    Ok((input, (full_len, group, command, payload_len)))
}

fn short(needed: usize, available: usize) -> DecodeError {
    DecodeError::ShortMessage { needed, available }
}

/// Parse the fixed part of an acknowledgement frame.
pub fn parse_ack_frame(raw: &[u8]) -> Result<AckFrame, DecodeError> {
    ack_header(raw)
        .map(|(_, frame)| frame)
        .map_err(|_| short(MIN_FRAME_LEN, raw.len()))
}

/// Parse a data frame, refusing to read past the end of `raw`.
///
/// Bytes after the declared payload are ignored.
pub fn parse_data_frame(raw: &[u8]) -> Result<DataFrame<'_>, DecodeError> {
    let (rest, (full_len, group, command, payload_len)) =
        data_header(raw).map_err(|_| short(DATA_HEADER_LEN, raw.len()))?;
    let declared = usize::from(payload_len);
    let (_, payload) = take_bytes(rest, declared).map_err(|_| DecodeError::TruncatedPayload {
        declared,
        available: rest.len(),
    })?;
    Ok(DataFrame {
        full_len,
        group,
        command,
        payload,
    })
}

/// Classify and decode one inbound buffer.
///
/// The header byte wins over every other heuristic: a buffer starting with
/// `0xCD` is a data frame even if it also happens to be valid text.
pub fn decode_frame(raw: &[u8]) -> DecodedMessage {
    if raw.len() < MIN_FRAME_LEN {
        return DecodedMessage::Error {
            kind: short(MIN_FRAME_LEN, raw.len()),
            raw: raw.to_vec(),
        };
    }

    let header = raw[offset::HEADER];
    let decoded = match FrameKind::from_header(header) {
        FrameKind::Ack => decode_ack(raw),
        FrameKind::Data => decode_data(raw),
        FrameKind::Unrecognized => DecodedMessage::Unknown {
            header,
            raw: raw.to_vec(),
            text_guess: printable_guess(raw),
        },
    };
    debug!(len = raw.len(), message = %decoded, "decoded inbound buffer");
    decoded
}

fn decode_ack(raw: &[u8]) -> DecodedMessage {
    let frame = match parse_ack_frame(raw) {
        Ok(frame) => frame,
        Err(kind) => {
            return DecodedMessage::Error {
                kind,
                raw: raw.to_vec(),
            }
        }
    };
    let key = CommandKey::new(frame.group, frame.command);
    let special_meaning = Descriptor::lookup(key)
        .ok()
        .and_then(|d| d.special_meaning);
    DecodedMessage::Ack {
        group: frame.group,
        command: frame.command,
        name: command_name(key).into_owned(),
        special_meaning,
    }
}

fn decode_data(raw: &[u8]) -> DecodedMessage {
    let frame = match parse_data_frame(raw) {
        Ok(frame) => frame,
        Err(kind) => {
            return DecodedMessage::Error {
                kind,
                raw: raw.to_vec(),
            }
        }
    };
    let key = CommandKey::new(frame.group, frame.command);
    let (name, payload) = match Descriptor::lookup(key) {
        Ok(descriptor) => {
            let payload = match descriptor.decoder {
                Some(decoder) => DecodedPayload::decode_with(decoder, frame.payload),
                None => DecodedPayload::RawHex {
                    bytes: frame.payload.to_vec(),
                },
            };
            (descriptor.name.to_string(), payload)
        }
        Err(err) => {
            debug!(
                group = group_name(frame.group).unwrap_or("unknown"),
                %err,
                "no descriptor, keeping raw payload"
            );
            (
                command_name(key).into_owned(),
                DecodedPayload::RawHex {
                    bytes: frame.payload.to_vec(),
                },
            )
        }
    };
    DecodedMessage::Data {
        group: frame.group,
        command: frame.command,
        name,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    #[test]
    fn test_round_trip_all_commands() {
        for group in 0..=u8::MAX {
            for command in 0..=u8::MAX {
                for len in [0usize, 1, 20, 255] {
                    let payload: Vec<u8> = (0..len).map(|i| (i as u8) ^ command).collect();
                    let frame = encode_frame(group, command, &payload).unwrap();
                    let parsed = parse_data_frame(&frame).unwrap();
                    assert_eq!(parsed.group, group);
                    assert_eq!(parsed.command, command);
                    assert_eq!(parsed.payload, payload.as_slice());
                    assert_eq!(usize::from(parsed.full_len), 5 + len);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_through_decode_frame() {
        let frame = encode_frame(0x20, 0x23, b"LT716").unwrap();
        assert_eq!(
            decode_frame(&frame),
            DecodedMessage::Data {
                group: 0x20,
                command: 0x23,
                name: "Get Band Name".to_string(),
                payload: DecodedPayload::RawHex {
                    bytes: b"LT716".to_vec()
                },
            }
        );
    }

    #[test]
    fn test_short_buffers() {
        for raw in [
            &[][..],
            &[0xCD][..],
            &[0xDC, 0, 0, 0x12][..],
            &[b'h', b'i', b'!', b'!'][..],
        ] {
            assert_eq!(
                decode_frame(raw),
                DecodedMessage::Error {
                    kind: DecodeError::ShortMessage {
                        needed: 5,
                        available: raw.len()
                    },
                    raw: raw.to_vec(),
                }
            );
        }
    }

    #[test]
    fn test_ack_find_band() {
        let decoded = decode_frame(&[0xDC, 0, 0, 0x12, 0x0B]);
        assert_eq!(
            decoded,
            DecodedMessage::Ack {
                group: 0x12,
                command: 0x0B,
                name: "Find Band".to_string(),
                special_meaning: Some(SpecialMeaning::Vibrating),
            }
        );
        assert_eq!(decoded.to_string(), "ACK: Find Band (vibrating)");
    }

    #[test]
    fn test_ack_without_special_meaning() {
        let decoded = decode_frame(&[0xDC, 0x00, 0x05, 0x12, 0x15, 0x00]);
        assert_eq!(decoded.to_string(), "ACK: Set Language");
        let decoded = decode_frame(&[0xDC, 0x00, 0x05, 0x12, 0x12]);
        assert_eq!(decoded.to_string(), "ACK: Notification Message (message displayed)");
        let decoded = decode_frame(&[0xDC, 0x00, 0x05, 0x44, 0x0c]);
        assert_eq!(decoded.to_string(), "ACK: Unknown(0x0c)");
    }

    #[test]
    fn test_data_header_too_short() {
        let raw = [0xCD, 0x00, 0x05, 0x15, 0x01, 0x02];
        assert_eq!(
            decode_frame(&raw),
            DecodedMessage::Error {
                kind: DecodeError::ShortMessage {
                    needed: 8,
                    available: 6
                },
                raw: raw.to_vec(),
            }
        );
    }

    #[test]
    fn test_truncated_payload() {
        // declares 4 payload bytes, carries 2
        let raw = [0xCD, 0x00, 0x09, 0x15, 0x01, 0x02, 0x00, 0x04, 0x27, 0x10];
        assert_eq!(
            decode_frame(&raw),
            DecodedMessage::Error {
                kind: DecodeError::TruncatedPayload {
                    declared: 4,
                    available: 2
                },
                raw: raw.to_vec(),
            }
        );

        let raw = [0xCD, 0x00, 0x05, 0x15, 0x01, 0x02, 0xFF, 0xFF];
        assert!(matches!(
            decode_frame(&raw),
            DecodedMessage::Error {
                kind: DecodeError::TruncatedPayload {
                    declared: 65535,
                    available: 0
                },
                ..
            }
        ));
    }

    #[test]
    fn test_step_data_frame() {
        let raw = [0xCD, 0x00, 0x09, 0x15, 0x01, 0x02, 0x00, 0x04, 0, 0, 0x27, 0x10];
        let decoded = decode_frame(&raw);
        assert_eq!(
            decoded,
            DecodedMessage::Data {
                group: 0x15,
                command: 0x02,
                name: "Step Data".to_string(),
                payload: DecodedPayload::StepCount { total: 10_000 },
            }
        );
        assert_eq!(decoded.to_string(), "Data: Step Data - 10000 steps");
    }

    #[test]
    fn test_hw_info_frame() {
        let frame = encode_frame(0x1A, 0x10, &[3, b'A', b'B', b'C', 2, b'v', b'1']).unwrap();
        assert_eq!(
            decode_frame(&frame).to_string(),
            "Data: Get HW Info - ABC / v1"
        );
    }

    #[test]
    fn test_heart_rate_insufficient() {
        let frame = encode_frame(0x15, 0x0E, &[0x01]).unwrap();
        match decode_frame(&frame) {
            DecodedMessage::Data { payload, .. } => {
                assert!(matches!(payload, DecodedPayload::Insufficient { .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_command_renders_raw_hex() {
        let frame = encode_frame(0x15, 0x7A, &[0xBE, 0xEF]).unwrap();
        let decoded = decode_frame(&frame);
        assert_eq!(decoded.to_string(), "Data: Unknown(0x7a) - 0xbeef");
        assert_eq!(decoded.key(), Some(CommandKey::new(0x15, 0x7A)));
    }

    #[test]
    fn test_empty_payload_echo() {
        let frame = encode_frame(0x12, 0x0B, &[]).unwrap();
        assert_eq!(decode_frame(&frame).to_string(), "Data: Find Band");
    }

    #[test]
    fn test_unknown_header_with_text() {
        let decoded = decode_frame(b"hello world");
        assert_eq!(
            decoded,
            DecodedMessage::Unknown {
                header: b'h',
                raw: b"hello world".to_vec(),
                text_guess: Some("hello world".to_string()),
            }
        );
        assert_eq!(
            decoded.to_string(),
            "Unknown (0x68): [104, 101, 108, 108, 111, 32, 119, 111, 114, 108...] \"hello world\""
        );
    }

    #[test]
    fn test_unknown_header_binary() {
        let decoded = decode_frame(&[0x00, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            decoded,
            DecodedMessage::Unknown {
                header: 0x00,
                raw: vec![0, 1, 2, 3, 4],
                text_guess: None,
            }
        );
        assert_eq!(decoded.to_string(), "Unknown (0x00): [0, 1, 2, 3, 4]");
    }

    #[test]
    fn test_header_wins_over_text() {
        // 0xCD followed by text is still a (truncated) data frame
        let mut raw = vec![0xCD];
        raw.extend_from_slice(b"abcdefgh");
        assert!(decode_frame(&raw).is_error());
        assert_eq!(FrameKind::from_header(0xCD), FrameKind::Data);
        assert!(!FrameKind::from_header(b'a').is_protocol());
    }
}
