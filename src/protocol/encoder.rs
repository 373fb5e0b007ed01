use tracing::debug;

use crate::error::EncodeError;
use crate::protocol::{
    command_name, offset, CommandKey, DATA_HEADER, DELIMITER, FULL_LEN_OVERHEAD,
};

/// Largest payload whose `full_len` still fits the 16-bit field.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - FULL_LEN_OVERHEAD;

/// Build an outgoing data frame.
///
/// Payloads that do not fit the 16-bit length field are rejected instead of
/// being silently wrapped.
pub fn encode_frame(group: u8, command: u8, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let payload_len = payload.len();
    // full_len counts the overhead too, so it overflows before payload_len does
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(EncodeError::PayloadTooLarge {
            len: payload_len,
            max: MAX_PAYLOAD_LEN,
        });
    }
    let full_len = (payload_len + FULL_LEN_OVERHEAD) as u16;
    let payload_len16 = payload_len as u16;

    let mut frame = Vec::with_capacity(offset::PAYLOAD + payload_len);
    frame.push(DATA_HEADER);
    frame.extend_from_slice(&full_len.to_be_bytes());
    frame.push(group);
    frame.push(DELIMITER);
    frame.push(command);
    frame.extend_from_slice(&payload_len16.to_be_bytes());
    frame.extend_from_slice(payload);

    debug!(
        command = %command_name(CommandKey::new(group, command)),
        len = frame.len(),
        "encoded fitpro frame"
    );
    Ok(frame)
}

/// [`encode_frame`] keyed by a [`CommandKey`].
pub fn encode_command(key: CommandKey, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    encode_frame(key.group, key.command, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_empty_payload() {
        let frame = encode_frame(0x1A, 0x10, &[]).unwrap();
        assert_eq!(frame, vec![0xCD, 0x00, 0x05, 0x1A, 0x01, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn test_layout_with_payload() {
        let frame = encode_frame(0x12, 0x15, &[0x02]).unwrap();
        assert_eq!(
            frame,
            vec![0xCD, 0x00, 0x06, 0x12, 0x01, 0x15, 0x00, 0x01, 0x02]
        );
    }

    #[test]
    fn test_lengths_are_big_endian() {
        let payload = vec![0xAA; 300];
        let frame = encode_frame(0x20, 0x23, &payload).unwrap();
        // 305 = 0x0131, 300 = 0x012C
        assert_eq!(&frame[1..3], &[0x01, 0x31]);
        assert_eq!(&frame[6..8], &[0x01, 0x2C]);
        assert_eq!(frame.len(), 8 + 300);
    }

    #[test]
    fn test_largest_accepted_payload() {
        assert_eq!(MAX_PAYLOAD_LEN, 65_530);
        let payload = vec![0u8; MAX_PAYLOAD_LEN];
        let frame = encode_frame(0x12, 0x01, &payload).unwrap();
        assert_eq!(&frame[1..3], &[0xFF, 0xFF]);
        assert_eq!(&frame[6..8], &[0xFF, 0xFA]);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        // payload_len fits in 16 bits but full_len would not
        let payload = vec![0u8; 65_531];
        let err = encode_frame(0x12, 0x01, &payload).unwrap_err();
        assert_eq!(
            err,
            EncodeError::PayloadTooLarge {
                len: 65_531,
                max: 65_530
            }
        );
        assert_eq!(
            err.to_string(),
            "payload too large: 65531 bytes (maximum 65530)"
        );

        let payload = vec![0u8; 70_000];
        assert!(encode_frame(0x12, 0x01, &payload).is_err());
    }

    #[test]
    fn test_encode_command() {
        let key = CommandKey::new(0x12, 0x0B);
        assert_eq!(
            encode_command(key, &[]).unwrap(),
            encode_frame(0x12, 0x0B, &[]).unwrap()
        );
    }
}
