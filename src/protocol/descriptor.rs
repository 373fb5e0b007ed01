//! Static command descriptor table shared by encoder-side logging and
//! decoder-side dispatch.

use std::borrow::Cow;

use crate::error::DecodeError;
use crate::protocol::*;

/// Sub-decoder selected for a data frame's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadDecoder {
    HardwareInfo,
    StepCount,
    HeartRate,
}

/// Physical effect a peripheral reports through an acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialMeaning {
    Vibrating,
    MessageDisplayed,
    CallDisplayed,
}

impl SpecialMeaning {
    pub fn label(&self) -> &'static str {
        match self {
            SpecialMeaning::Vibrating => "vibrating",
            SpecialMeaning::MessageDisplayed => "message displayed",
            SpecialMeaning::CallDisplayed => "call displayed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub key: CommandKey,
    pub name: &'static str,
    pub decoder: Option<PayloadDecoder>,
    /// Only consulted for acknowledgement frames.
    pub special_meaning: Option<SpecialMeaning>,
}

const fn entry(group: u8, command: u8, name: &'static str) -> Descriptor {
    Descriptor {
        key: CommandKey::new(group, command),
        name,
        decoder: None,
        special_meaning: None,
    }
}

const fn decoded(
    group: u8,
    command: u8,
    name: &'static str,
    decoder: PayloadDecoder,
) -> Descriptor {
    Descriptor {
        key: CommandKey::new(group, command),
        name,
        decoder: Some(decoder),
        special_meaning: None,
    }
}

const fn acked(group: u8, command: u8, name: &'static str, meaning: SpecialMeaning) -> Descriptor {
    Descriptor {
        key: CommandKey::new(group, command),
        name,
        decoder: None,
        special_meaning: Some(meaning),
    }
}

/// Every command this crate knows by name.
pub static DESCRIPTORS: [Descriptor; 15] = [
    entry(CMD_GROUP_GENERAL, CMD_SET_DATE_TIME, "Set Date/Time"),
    entry(CMD_GROUP_GENERAL, CMD_SET_STEP_GOAL, "Set Step Goal"),
    entry(CMD_GROUP_GENERAL, CMD_SET_USER_INFO, "Set User Info"),
    acked(CMD_GROUP_GENERAL, CMD_FIND_BAND, "Find Band", SpecialMeaning::Vibrating),
    acked(
        CMD_GROUP_GENERAL,
        CMD_NOTIFICATION_CALL,
        "Notification Call",
        SpecialMeaning::CallDisplayed,
    ),
    acked(
        CMD_GROUP_GENERAL,
        CMD_NOTIFICATION_MESSAGE,
        "Notification Message",
        SpecialMeaning::MessageDisplayed,
    ),
    entry(CMD_GROUP_GENERAL, CMD_SET_LANGUAGE, "Set Language"),
    decoded(CMD_GROUP_SPORTS_DATA, CMD_STEP_DATA, "Step Data", PayloadDecoder::StepCount),
    entry(CMD_GROUP_SPORTS_DATA, CMD_DAY_STEPS_SUMMARY, "Day Steps Summary"),
    decoded(
        CMD_GROUP_SPORTS_DATA,
        CMD_HEART_RATE_DATA,
        "Heart Rate Data",
        PayloadDecoder::HeartRate,
    ),
    decoded(
        CMD_GROUP_REQUEST_DATA,
        CMD_GET_HW_INFO,
        "Get HW Info",
        PayloadDecoder::HardwareInfo,
    ),
    entry(CMD_GROUP_BUTTON_DATA, CMD_FIND_PHONE, "Find Phone"),
    entry(CMD_GROUP_BUTTON_DATA, CMD_MEDIA_PLAY_PAUSE, "Media Play/Pause"),
    entry(CMD_GROUP_RESET, CMD_FACTORY_RESET, "Factory Reset"),
    entry(CMD_GROUP_BAND_INFO, CMD_GET_BAND_NAME, "Get Band Name"),
];

impl Descriptor {
    /// Find the descriptor for a command, or report it as unknown.
    pub fn lookup(key: CommandKey) -> Result<&'static Descriptor, DecodeError> {
        DESCRIPTORS
            .iter()
            .find(|d| d.key == key)
            .ok_or(DecodeError::UnknownCommand {
                group: key.group,
                command: key.command,
            })
    }
}

/// Display name of a command; unknown pairs render as `Unknown(0x..)`.
pub fn command_name(key: CommandKey) -> Cow<'static, str> {
    match Descriptor::lookup(key) {
        Ok(d) => Cow::Borrowed(d.name),
        Err(_) => Cow::Owned(format!("Unknown(0x{:02x})", key.command)),
    }
}

/// Human-readable name of a command group.
pub fn group_name(group: u8) -> Option<&'static str> {
    match group {
        CMD_GROUP_GENERAL => Some("General"),
        CMD_GROUP_SPORTS_DATA => Some("Sports Data"),
        CMD_GROUP_REQUEST_DATA => Some("Request Data"),
        CMD_GROUP_BUTTON_DATA => Some("Button Actions"),
        CMD_GROUP_RESET => Some("Reset"),
        CMD_GROUP_BAND_INFO => Some("Band Info"),
        _ => None,
    }
}
