use thiserror::Error;

/// Error returned when an outgoing frame cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("payload too large: {len} bytes (maximum {max})")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Reasons an inbound buffer could not be turned into a protocol message.
///
/// None of these are fatal: the decoder folds every one of them into a
/// renderable [`DecodedMessage`](crate::protocol::DecodedMessage).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message too short: need {needed} bytes, got {available}")]
    ShortMessage { needed: usize, available: usize },

    #[error("truncated payload: declared {declared} bytes, {available} available")]
    TruncatedPayload { declared: usize, available: usize },

    #[error("unknown command 0x{command:02x} in group 0x{group:02x}")]
    UnknownCommand { group: u8, command: u8 },

    #[error("bytes are not valid utf-8")]
    TextDecodeFailure,
}

/// Marker returned by a payload sub-decoder that was handed too few bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Failures reported by the BLE transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BleError {
    #[error("peripheral not connected")]
    NotConnected,

    #[error("peripheral not found")]
    DeviceNotFound,

    #[error("connection failed")]
    ConnectionFailed,

    #[error("gatt error: {0}")]
    GattError(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("notification setup failed: {0}")]
    NotificationFailed(String),
}

/// Failure to send a single command over a link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Ble(#[from] BleError),
}

/// Why the initialization handshake stopped early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("peripheral does not expose the fitpro service")]
    NotProtocolCapable,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("step {step} ({command}) failed: {source}")]
    WriteFailed {
        step: usize,
        command: String,
        source: BleError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ShortMessage {
            needed: 5,
            available: 3,
        };
        assert_eq!(err.to_string(), "message too short: need 5 bytes, got 3");

        let err = DecodeError::UnknownCommand {
            group: 0x12,
            command: 0x0b,
        };
        assert_eq!(err.to_string(), "unknown command 0x0b in group 0x12");
    }

    #[test]
    fn test_sequence_error_display() {
        let err = SequenceError::WriteFailed {
            step: 2,
            command: "Set User Info".to_string(),
            source: BleError::NotConnected,
        };
        assert_eq!(
            err.to_string(),
            "step 2 (Set User Info) failed: peripheral not connected"
        );

        let err: SequenceError = EncodeError::PayloadTooLarge {
            len: 70_000,
            max: 65_530,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "payload too large: 70000 bytes (maximum 65530)"
        );
    }
}
