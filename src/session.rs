//! Per-connection state.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::ble::{uuid_eq, PeripheralInfo, UART_SERVICE_UUID};
use crate::protocol::CommandKey;

/// Entries kept when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    Sent,
    Received,
    System,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    /// `[HH:MM:SS] text`
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Bounded, append-only message log; the oldest entry goes first when full.
#[derive(Clone, Debug)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBook {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, kind: LogKind, text: impl Into<String>) -> &LogEntry {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp: Local::now(),
            kind,
            text: text.into(),
        });
        // just pushed
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::render).collect()
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

/// Placeholder for a device information field that could not be read.
pub const NOT_AVAILABLE: &str = "N/A";

/// Strings read from the standard device information service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub hardware_revision: String,
    pub firmware_revision: String,
    pub software_revision: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            manufacturer: NOT_AVAILABLE.to_string(),
            model: NOT_AVAILABLE.to_string(),
            serial_number: NOT_AVAILABLE.to_string(),
            hardware_revision: NOT_AVAILABLE.to_string(),
            firmware_revision: NOT_AVAILABLE.to_string(),
            software_revision: NOT_AVAILABLE.to_string(),
        }
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (serial {}, hw {}, fw {}, sw {})",
            self.manufacturer,
            self.model,
            self.serial_number,
            self.hardware_revision,
            self.firmware_revision,
            self.software_revision
        )
    }
}

/// State owned by one connection to one peripheral.
#[derive(Clone, Debug)]
pub struct DeviceSession {
    peripheral_id: String,
    name: Option<String>,
    protocol_capable: bool,
    pub battery_percent: Option<u8>,
    pub device_info: Option<DeviceInfo>,
    /// Last command written and not yet answered by a matching ack or data frame.
    pub awaiting: Option<CommandKey>,
    pub log: LogBook,
}

impl DeviceSession {
    /// Capability is decided here, once, from the advertised services.
    pub fn new(
        peripheral_id: impl Into<String>,
        name: Option<String>,
        advertised_services: &[String],
        log_capacity: usize,
    ) -> Self {
        let protocol_capable = advertised_services
            .iter()
            .any(|s| uuid_eq(s, UART_SERVICE_UUID));
        Self {
            peripheral_id: peripheral_id.into(),
            name,
            protocol_capable,
            battery_percent: None,
            device_info: None,
            awaiting: None,
            log: LogBook::with_capacity(log_capacity),
        }
    }

    pub fn from_peripheral(info: &PeripheralInfo, log_capacity: usize) -> Self {
        Self::new(
            info.id.clone(),
            info.name.clone(),
            &info.advertised_services,
            log_capacity,
        )
    }

    pub fn peripheral_id(&self) -> &str {
        &self.peripheral_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_protocol_capable(&self) -> bool {
        self.protocol_capable
    }

    /// Clear `awaiting` if `key` answers it. Returns whether it did.
    pub fn settle(&mut self, key: CommandKey) -> bool {
        if self.awaiting == Some(key) {
            self.awaiting = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_from_services() {
        let services = vec!["180F".to_string(), UART_SERVICE_UUID.to_uppercase()];
        let session = DeviceSession::new("p1", None, &services, 10);
        assert!(session.is_protocol_capable());

        let services = vec!["180F".to_string()];
        let session = DeviceSession::new("p2", Some("Mac".to_string()), &services, 10);
        assert!(!session.is_protocol_capable());
        assert_eq!(session.name(), Some("Mac"));
    }

    #[test]
    fn test_log_book_drops_oldest() {
        let mut log = LogBook::with_capacity(3);
        for i in 0..5 {
            log.push(LogKind::Received, format!("entry {i}"));
        }
        assert_eq!(log.len(), 3);
        let texts: Vec<&str> = log.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_log_entry_render() {
        let mut log = LogBook::default();
        let entry = log.push(LogKind::System, "ready").clone();
        let rendered = entry.render();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("] ready"));
        // "[HH:MM:SS] " prefix
        assert_eq!(rendered.len(), "[00:00:00] ready".len());
        assert_eq!(log.rendered(), vec![rendered]);
    }

    #[test]
    fn test_device_info_defaults_to_not_available() {
        let info = DeviceInfo {
            model: "LT716".to_string(),
            ..Default::default()
        };
        assert_eq!(info.manufacturer, NOT_AVAILABLE);
        assert_eq!(
            info.to_string(),
            "N/A LT716 (serial N/A, hw N/A, fw N/A, sw N/A)"
        );
    }

    #[test]
    fn test_settle() {
        let mut session = DeviceSession::new("p1", None, &[], 10);
        let key = CommandKey::new(0x12, 0x0B);
        session.awaiting = Some(key);
        assert!(!session.settle(CommandKey::new(0x12, 0x01)));
        assert!(session.settle(key));
        assert_eq!(session.awaiting, None);
    }
}
