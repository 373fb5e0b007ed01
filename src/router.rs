//! Turns inbound notifications into session log entries.
//!
//! Every event yields exactly one entry. Protocol frames are decoded only when
//! they arrive on the UART TX characteristic of a protocol-capable session and
//! start with a FitPro header; everything else on that characteristic is text
//! from a non-protocol peer.

use tracing::{debug, trace};

use crate::ble::{
    Notification, BATTERY_LEVEL_CHAR_UUID, BATTERY_SERVICE_UUID, UART_SERVICE_UUID,
    UART_TX_CHAR_UUID,
};
use crate::protocol::text::{byte_list, decode_utf8};
use crate::protocol::{decode_frame, to_hex, FrameKind};
use crate::session::{DeviceSession, LogEntry, LogKind};

/// Where an event is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    ForeignPeripheral,
    ProtocolFrame,
    PeerText,
    Battery,
    Generic,
}

/// Pick the route for an event without touching the session.
pub fn classify(session: &DeviceSession, event: &Notification) -> Route {
    if event.peripheral_id != session.peripheral_id() {
        return Route::ForeignPeripheral;
    }
    if event.is_from(UART_SERVICE_UUID, UART_TX_CHAR_UUID) {
        let framed = event
            .value
            .first()
            .is_some_and(|&h| FrameKind::from_header(h).is_protocol());
        return if session.is_protocol_capable() && framed {
            Route::ProtocolFrame
        } else {
            Route::PeerText
        };
    }
    if event.is_from(BATTERY_SERVICE_UUID, BATTERY_LEVEL_CHAR_UUID) {
        return Route::Battery;
    }
    Route::Generic
}

/// Last four characters of a UUID, the way the log tags sources.
pub fn short_uuid(uuid: &str) -> &str {
    let start = uuid
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &uuid[start..]
}

/// Route one event and append its log entry to the session.
pub fn route_notification<'s>(
    session: &'s mut DeviceSession,
    event: &Notification,
) -> &'s LogEntry {
    let route = classify(session, event);
    trace!(?route, len = event.value.len(), "routing notification");

    let tag = format!(
        "S:{} C:{} - ",
        short_uuid(&event.service),
        short_uuid(&event.characteristic)
    );
    let (kind, text) = match route {
        Route::ForeignPeripheral => (
            LogKind::System,
            format!("Ignored notification from {}", event.peripheral_id),
        ),
        Route::ProtocolFrame => {
            let message = decode_frame(&event.value);
            if let Some(key) = message.key() {
                if session.settle(key) {
                    debug!(%key, "command answered");
                }
            }
            let kind = if message.is_error() {
                LogKind::Error
            } else {
                LogKind::Received
            };
            (kind, format!("{tag}{message}"))
        }
        Route::PeerText => match decode_utf8(&event.value) {
            Ok(text) => (LogKind::Received, format!("{tag}Text: \"{text}\"")),
            Err(err) => {
                debug!(%err, "peer text fallback to raw bytes");
                (
                    LogKind::Received,
                    format!("{tag}Text (raw): {}", full_list(&event.value)),
                )
            }
        },
        Route::Battery => match event.value.first() {
            Some(&percent) => {
                session.battery_percent = Some(percent);
                (LogKind::Received, format!("{tag}Battery Level: {percent}%"))
            }
            None => (LogKind::Error, format!("{tag}Battery Level: empty value")),
        },
        Route::Generic => match decode_utf8(&event.value) {
            Ok(text) => (
                LogKind::Received,
                format!("{tag}Data: \"{text}\" (Hex: {})", to_hex(&event.value)),
            ),
            Err(_) => (
                LogKind::Received,
                format!(
                    "{tag}Raw: {} (Hex: {})",
                    full_list(&event.value),
                    to_hex(&event.value)
                ),
            ),
        },
    };
    session.log.push(kind, text)
}

fn full_list(bytes: &[u8]) -> String {
    byte_list(bytes, bytes.len())
}
