//! FitPro command/response protocol.
//!
//! Frames travel inside writes to, and notifications from, the vendor UART
//! characteristics. Every multi-byte field is big-endian.
//!
//! ```text
//! offset  0      1-2         3      4          5        6-7          8..
//!         header full_len    group  delimiter  command  payload_len  payload
//! ```
//!
//! Acknowledgement frames (`0xDC`) carry the command at offset 4 instead of the
//! delimiter and have no payload section.
//!
//! # Example
//!
//! ```
//! use fitpro_link::protocol::{decode_frame, encode_frame, DecodedMessage, DecodedPayload};
//!
//! let frame = encode_frame(0x15, 0x02, &[0x00, 0x00, 0x27, 0x10]).expect("small payload");
//! match decode_frame(&frame) {
//!     DecodedMessage::Data { payload, .. } => {
//!         assert_eq!(payload, DecodedPayload::StepCount { total: 10_000 });
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod payload;
pub mod text;

pub use decoder::{decode_frame, DecodedMessage, FrameKind};
pub use descriptor::{command_name, Descriptor, PayloadDecoder, SpecialMeaning, DESCRIPTORS};
pub use encoder::{encode_frame, MAX_PAYLOAD_LEN};
pub use payload::DecodedPayload;

/// Header byte of a data frame.
pub const DATA_HEADER: u8 = 0xCD;
/// Header byte of an acknowledgement frame.
pub const ACK_HEADER: u8 = 0xDC;
/// Fixed byte at offset 4 of every data frame.
pub const DELIMITER: u8 = 0x01;

pub const CMD_GROUP_GENERAL: u8 = 0x12;
pub const CMD_GROUP_SPORTS_DATA: u8 = 0x15;
pub const CMD_GROUP_REQUEST_DATA: u8 = 0x1A;
pub const CMD_GROUP_BUTTON_DATA: u8 = 0x1C;
pub const CMD_GROUP_RESET: u8 = 0x1D;
pub const CMD_GROUP_BAND_INFO: u8 = 0x20;

// General (0x12)
pub const CMD_SET_DATE_TIME: u8 = 0x01;
pub const CMD_SET_STEP_GOAL: u8 = 0x03;
pub const CMD_SET_USER_INFO: u8 = 0x09;
pub const CMD_FIND_BAND: u8 = 0x0B;
pub const CMD_NOTIFICATION_CALL: u8 = 0x11;
pub const CMD_NOTIFICATION_MESSAGE: u8 = 0x12;
pub const CMD_SET_LANGUAGE: u8 = 0x15;

// Sports data (0x15)
pub const CMD_STEP_DATA: u8 = 0x02;
pub const CMD_DAY_STEPS_SUMMARY: u8 = 0x06;
pub const CMD_HEART_RATE_DATA: u8 = 0x0E;

// Request data (0x1A)
pub const CMD_GET_HW_INFO: u8 = 0x10;

// Button actions (0x1C)
pub const CMD_FIND_PHONE: u8 = 0x01;
pub const CMD_MEDIA_PLAY_PAUSE: u8 = 0x0B;

// Reset (0x1D)
pub const CMD_FACTORY_RESET: u8 = 0x01;

// Band info (0x20)
pub const CMD_GET_BAND_NAME: u8 = 0x23;

/// Byte offsets inside a frame.
pub mod offset {
    pub const HEADER: usize = 0;
    pub const PAYLOAD: usize = 8;
}

/// Bytes counted by `full_len` besides the payload itself.
pub const FULL_LEN_OVERHEAD: usize = 5;

/// A `(group, command)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandKey {
    pub group: u8,
    pub command: u8,
}

impl CommandKey {
    pub const fn new(group: u8, command: u8) -> Self {
        Self { group, command }
    }
}

impl std::fmt::Display for CommandKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02x}/0x{:02x}", self.group, self.command)
    }
}

/// Lowercase hex, no separators.
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
