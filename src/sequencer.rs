//! Device initialization handshake.
//!
//! Four writes in a fixed order: time, user profile, language, hardware-info
//! request. The peripheral processes commands one at a time and has no request
//! ids, so the steps are spaced by a fixed delay rather than waiting for acks.
//! The hardware-info reply arrives later as an ordinary notification.
//!
//! A failed write ends the sequence; steps already applied stay applied.

use std::borrow::Cow;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use tracing::info;

use crate::ble::BleTransport;
use crate::connection::Link;
use crate::error::{EncodeError, SequenceError};
use crate::models::UserProfile;
use crate::protocol::encoder::encode_command;
use crate::protocol::*;

/// Something that can wait between handshake steps.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Blocks the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeStep {
    pub key: CommandKey,
    pub payload: Vec<u8>,
}

impl HandshakeStep {
    pub fn name(&self) -> Cow<'static, str> {
        command_name(self.key)
    }

    pub fn frame(&self) -> Result<Vec<u8>, EncodeError> {
        encode_command(self.key, &self.payload)
    }
}

/// `[year - 2000, month, day, hour, minute, second]`
pub fn date_time_payload(now: &NaiveDateTime) -> [u8; 6] {
    let year = (now.year() - 2000).clamp(0, i32::from(u8::MAX)) as u8;
    [
        year,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    ]
}

pub fn initialization_steps(
    now: &NaiveDateTime,
    profile: &UserProfile,
    language_code: u8,
) -> Vec<HandshakeStep> {
    vec![
        HandshakeStep {
            key: CommandKey::new(CMD_GROUP_GENERAL, CMD_SET_DATE_TIME),
            payload: date_time_payload(now).to_vec(),
        },
        HandshakeStep {
            key: CommandKey::new(CMD_GROUP_GENERAL, CMD_SET_USER_INFO),
            payload: profile.to_payload().to_vec(),
        },
        HandshakeStep {
            key: CommandKey::new(CMD_GROUP_GENERAL, CMD_SET_LANGUAGE),
            payload: vec![language_code],
        },
        HandshakeStep {
            key: CommandKey::new(CMD_GROUP_REQUEST_DATA, CMD_GET_HW_INFO),
            payload: Vec::new(),
        },
    ]
}

/// Run the handshake over `link`, pausing between steps.
///
/// Returns the number of steps written.
pub fn run_initialization<T, P>(
    link: &mut Link<T>,
    pacer: &mut P,
    now: &NaiveDateTime,
) -> Result<usize, SequenceError>
where
    T: BleTransport,
    P: Pacer,
{
    if !link.session().is_protocol_capable() {
        return Err(SequenceError::NotProtocolCapable);
    }

    let config = link.config().clone();
    let steps = initialization_steps(now, &config.profile, config.language_code);
    let total = steps.len();
    for (index, step) in steps.iter().enumerate() {
        let frame = step.frame()?;
        info!(step = index + 1, total, command = %step.name(), "handshake");
        link.write_frame(step.key, &frame)
            .map_err(|source| SequenceError::WriteFailed {
                step: index + 1,
                command: step.name().into_owned(),
                source,
            })?;
        if index + 1 < total {
            pacer.pause(config.step_delay);
        }
    }
    Ok(total)
}

/// [`run_initialization`] with the local wall clock and real sleeps.
///
/// This blocks the calling thread for the whole handshake while holding the
/// link, so no notification (acks included) is routed until it returns. Hosts
/// that drive notifications from the same thread should send
/// [`initialization_frames`](crate::ffi::initialization_frames) themselves and
/// pace the writes on their own event loop.
pub fn initialize<T: BleTransport>(link: &mut Link<T>) -> Result<usize, SequenceError> {
    let now = Local::now().naive_local();
    run_initialization(link, &mut ThreadPacer, &now)
}
