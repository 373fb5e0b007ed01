pub mod ble;
pub mod ble_mock;
pub mod connection;
pub mod error;
pub mod ffi;
pub mod models;
pub mod protocol;
pub mod router;
pub mod sequencer;
pub mod session;

uniffi::include_scaffolding!("fitpro");

pub use ble::{BleTransport, Notification, PeripheralInfo};
pub use connection::Link;
pub use error::{BleError, DecodeError, EncodeError, LinkError, PayloadError, SequenceError};
pub use ffi::{
    build_command, command_name, describe_frame, initialization_frames, FitProSession,
    HandshakeFrame,
};
pub use models::{Gender, LinkConfig, UserProfile};
pub use protocol::{decode_frame, encode_frame, CommandKey, DecodedMessage, DecodedPayload};
pub use router::route_notification;
pub use sequencer::{initialize, run_initialization, Pacer, ThreadPacer};
pub use session::{DeviceInfo, DeviceSession, LogEntry, LogKind};
