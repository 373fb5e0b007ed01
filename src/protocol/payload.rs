//! Per-command payload sub-decoders.

use nom::{
    bytes::complete::take,
    multi::length_data,
    number::complete::{be_u32, be_u8},
    sequence::preceded,
    IResult, Parser,
};

use crate::error::PayloadError;
use crate::protocol::descriptor::PayloadDecoder;
use crate::protocol::to_hex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedPayload {
    HardwareInfo {
        model: Option<String>,
        version: Option<String>,
    },
    StepCount {
        total: u32,
    },
    HeartRate {
        bpm: u8,
    },
    RawHex {
        bytes: Vec<u8>,
    },
    /// A sub-decoder was selected but the payload was too short for it.
    Insufficient {
        decoder: PayloadDecoder,
        error: PayloadError,
        bytes: Vec<u8>,
    },
}

impl DecodedPayload {
    /// Run the selected sub-decoder, turning a short payload into
    /// [`DecodedPayload::Insufficient`].
    pub fn decode_with(decoder: PayloadDecoder, payload: &[u8]) -> Self {
        let result = match decoder {
            PayloadDecoder::HardwareInfo => Ok(decode_hardware_info(payload)),
            PayloadDecoder::StepCount => decode_step_count(payload),
            PayloadDecoder::HeartRate => decode_heart_rate(payload),
        };
        result.unwrap_or_else(|error| DecodedPayload::Insufficient {
            decoder,
            error,
            bytes: payload.to_vec(),
        })
    }
}

impl std::fmt::Display for DecodedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodedPayload::HardwareInfo { model, version } => {
                let parts: Vec<&str> = [model, version]
                    .into_iter()
                    .filter_map(|s| s.as_deref())
                    .collect();
                write!(f, "{}", parts.join(" / "))
            }
            DecodedPayload::StepCount { total } => write!(f, "{total} steps"),
            DecodedPayload::HeartRate { bpm } => write!(f, "{bpm} bpm"),
            DecodedPayload::RawHex { bytes } => write!(f, "0x{}", to_hex(bytes)),
            DecodedPayload::Insufficient { error, bytes, .. } if bytes.is_empty() => {
                write!(f, "{error}")
            }
            DecodedPayload::Insufficient { error, bytes, .. } => {
                write!(f, "{error} (0x{})", to_hex(bytes))
            }
        }
    }
}

fn byte(input: &[u8]) -> IResult<&[u8], u8> {
    be_u8(input)
}

fn length_prefixed(input: &[u8]) -> IResult<&[u8], &[u8]> {
    length_data(byte).parse(input)
}

fn word32(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

fn second_byte(input: &[u8]) -> IResult<&[u8], u8> {
    preceded(take(1usize), byte).parse(input)
}

/// Up to two length-prefixed strings: model, then version.
///
/// Stops at the first prefix that claims more bytes than remain and keeps
/// whatever was read before it.
pub fn decode_hardware_info(payload: &[u8]) -> DecodedPayload {
    let mut fields: [Option<String>; 2] = [None, None];
    let mut rest = payload;
    for slot in fields.iter_mut() {
        match length_prefixed(rest) {
            Ok((remaining, raw)) => {
                *slot = Some(String::from_utf8_lossy(raw).into_owned());
                rest = remaining;
            }
            Err(_) => break,
        }
    }
    let [model, version] = fields;
    DecodedPayload::HardwareInfo { model, version }
}

/// Big-endian `u32` over the first four bytes.
pub fn decode_step_count(payload: &[u8]) -> Result<DecodedPayload, PayloadError> {
    let (_, total) = word32(payload).map_err(|_| PayloadError::InsufficientData {
        needed: 4,
        available: payload.len(),
    })?;
    Ok(DecodedPayload::StepCount { total })
}

/// The rate sits at offset 1; offset 0 is not part of the reading.
pub fn decode_heart_rate(payload: &[u8]) -> Result<DecodedPayload, PayloadError> {
    let (_, bpm) = second_byte(payload).map_err(|_| PayloadError::InsufficientData {
        needed: 2,
        available: payload.len(),
    })?;
    Ok(DecodedPayload::HeartRate { bpm })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_info_two_strings() {
        let payload = [3, b'A', b'B', b'C', 2, b'v', b'1'];
        assert_eq!(
            decode_hardware_info(&payload),
            DecodedPayload::HardwareInfo {
                model: Some("ABC".to_string()),
                version: Some("v1".to_string()),
            }
        );
    }

    #[test]
    fn test_hardware_info_stops_at_overlong_prefix() {
        let payload = [3, b'A', b'B', b'C', 9, b'v'];
        assert_eq!(
            decode_hardware_info(&payload),
            DecodedPayload::HardwareInfo {
                model: Some("ABC".to_string()),
                version: None,
            }
        );
    }

    #[test]
    fn test_hardware_info_ignores_third_string() {
        let payload = [1, b'M', 1, b'V', 1, b'X'];
        let decoded = decode_hardware_info(&payload);
        assert_eq!(decoded.to_string(), "M / V");
    }

    #[test]
    fn test_hardware_info_empty() {
        assert_eq!(
            decode_hardware_info(&[]),
            DecodedPayload::HardwareInfo {
                model: None,
                version: None,
            }
        );
        // zero-length model is still a field
        assert_eq!(
            decode_hardware_info(&[0]),
            DecodedPayload::HardwareInfo {
                model: Some(String::new()),
                version: None,
            }
        );
    }

    #[test]
    fn test_step_count() {
        assert_eq!(
            decode_step_count(&[0, 0, 0x27, 0x10]),
            Ok(DecodedPayload::StepCount { total: 10_000 })
        );
        // trailing bytes are ignored
        assert_eq!(
            decode_step_count(&[0xFF, 0xFF, 0xFF, 0xFF, 0x01]),
            Ok(DecodedPayload::StepCount { total: u32::MAX })
        );
    }

    #[test]
    fn test_step_count_insufficient() {
        assert_eq!(
            decode_step_count(&[0x27, 0x10]),
            Err(PayloadError::InsufficientData {
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_heart_rate() {
        assert_eq!(
            decode_heart_rate(&[0x00, 72, 0x05]),
            Ok(DecodedPayload::HeartRate { bpm: 72 })
        );
        assert_eq!(
            decode_heart_rate(&[72]),
            Err(PayloadError::InsufficientData {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_decode_with_marks_insufficient() {
        let decoded = DecodedPayload::decode_with(PayloadDecoder::StepCount, &[1, 2]);
        assert_eq!(
            decoded,
            DecodedPayload::Insufficient {
                decoder: PayloadDecoder::StepCount,
                error: PayloadError::InsufficientData {
                    needed: 4,
                    available: 2
                },
                bytes: vec![1, 2],
            }
        );
        assert_eq!(
            decoded.to_string(),
            "insufficient data: need 4 bytes, got 2 (0x0102)"
        );

        let empty = DecodedPayload::decode_with(PayloadDecoder::HeartRate, &[]);
        assert_eq!(
            empty.to_string(),
            "insufficient data: need 2 bytes, got 0"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DecodedPayload::StepCount { total: 42 }.to_string(),
            "42 steps"
        );
        assert_eq!(DecodedPayload::HeartRate { bpm: 61 }.to_string(), "61 bpm");
        assert_eq!(
            DecodedPayload::RawHex {
                bytes: vec![0xde, 0xad]
            }
            .to_string(),
            "0xdead"
        );
    }
}
