//! Host-facing API exported through uniffi.
//!
//! The mobile host owns the native BLE plugin. It hands every notification to
//! a [`FitProSession`] and writes the frames produced here.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;

use crate::ble::Notification;
use crate::error::EncodeError;
use crate::models::{Gender, UserProfile};
use crate::protocol::{self, CommandKey};
use crate::router::route_notification;
use crate::sequencer::initialization_steps;
use crate::session::{DeviceSession, DEFAULT_LOG_CAPACITY};

/// One handshake write, ready for the host to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeFrame {
    pub label: String,
    pub frame: Vec<u8>,
    pub delay_after_ms: u32,
}

pub fn build_command(group: u8, command: u8, payload: Vec<u8>) -> Result<Vec<u8>, EncodeError> {
    protocol::encode_frame(group, command, &payload)
}

pub fn describe_frame(raw: Vec<u8>) -> String {
    protocol::decode_frame(&raw).to_string()
}

pub fn command_name(group: u8, command: u8) -> String {
    protocol::command_name(CommandKey::new(group, command)).into_owned()
}

/// Handshake frames stamped with the local wall clock.
pub fn initialization_frames(
    profile: UserProfile,
    language_code: u8,
) -> Result<Vec<HandshakeFrame>, EncodeError> {
    let now = Local::now().naive_local();
    let delay_ms = crate::models::DEFAULT_STEP_DELAY.as_millis() as u32;
    let steps = initialization_steps(&now, &profile, language_code);
    let last = steps.len().saturating_sub(1);
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| -> Result<HandshakeFrame, EncodeError> {
            Ok(HandshakeFrame {
                label: step.name().into_owned(),
                frame: step.frame()?,
                delay_after_ms: if index < last { delay_ms } else { 0 },
            })
        })
        .collect()
}

/// Session state shared with the host across the FFI boundary.
pub struct FitProSession {
    inner: Mutex<DeviceSession>,
}

impl FitProSession {
    pub fn new(peripheral_id: String, advertised_services: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(DeviceSession::new(
                peripheral_id,
                None,
                &advertised_services,
                DEFAULT_LOG_CAPACITY,
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route one notification; returns the rendered log entry it produced.
    pub fn handle_notification(
        &self,
        service_uuid: String,
        characteristic_uuid: String,
        value: Vec<u8>,
    ) -> String {
        let mut session = self.lock();
        let event = Notification {
            peripheral_id: session.peripheral_id().to_string(),
            service: service_uuid,
            characteristic: characteristic_uuid,
            value,
        };
        route_notification(&mut session, &event).render()
    }

    pub fn is_protocol_capable(&self) -> bool {
        self.lock().is_protocol_capable()
    }

    pub fn battery_percent(&self) -> Option<u8> {
        self.lock().battery_percent
    }

    /// Oldest first.
    pub fn log_entries(&self) -> Vec<String> {
        self.lock().log.rendered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::UART_SERVICE_UUID;

    #[test]
    fn test_build_and_describe() {
        let frame = build_command(0x15, 0x02, vec![0, 0, 0x27, 0x10]).unwrap();
        assert_eq!(describe_frame(frame), "Data: Step Data - 10000 steps");
        assert_eq!(command_name(0x1C, 0x01), "Find Phone");
        assert!(build_command(0x12, 0x01, vec![0; 70_000]).is_err());
    }

    #[test]
    fn test_initialization_frames() {
        let profile = UserProfile {
            gender: Gender::Female,
            age: 40,
            height_cm: 160,
            weight_kg: 55,
            step_goal: 6_000,
        };
        let frames = initialization_frames(profile, 0x01).unwrap();
        let labels: Vec<&str> = frames.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Set Date/Time", "Set User Info", "Set Language", "Get HW Info"]
        );
        assert_eq!(frames[0].delay_after_ms, 300);
        assert_eq!(frames[3].delay_after_ms, 0);
        assert_eq!(&frames[1].frame[8..], &[0, 40, 160, 55, 0x17, 0x70]);
    }

    #[test]
    fn test_session_battery_end_to_end() {
        let session = FitProSession::new("band".to_string(), vec![UART_SERVICE_UUID.to_string()]);
        assert!(session.is_protocol_capable());
        assert_eq!(session.battery_percent(), None);

        let rendered =
            session.handle_notification("180F".to_string(), "2A19".to_string(), vec![57]);
        assert!(rendered.ends_with("Battery Level: 57%"));
        assert_eq!(session.battery_percent(), Some(57));
        assert_eq!(session.log_entries(), vec![rendered]);
    }
}
