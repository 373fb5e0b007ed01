//! One live connection: a transport, the session it feeds, and the only path
//! for writes to the peripheral.
//!
//! Every write needs `&mut Link`, so at most one writer exists per session.

use tracing::{debug, info, warn};

use crate::ble::{
    BleError, BleTransport, Notification, PeripheralInfo, BATTERY_LEVEL_CHAR_UUID,
    BATTERY_SERVICE_UUID, DEVICE_INFO_SERVICE_UUID, FIRMWARE_REVISION_CHAR_UUID,
    HARDWARE_REVISION_CHAR_UUID, MANUFACTURER_NAME_CHAR_UUID, MODEL_NUMBER_CHAR_UUID,
    SERIAL_NUMBER_CHAR_UUID, SOFTWARE_REVISION_CHAR_UUID, UART_RX_CHAR_UUID, UART_SERVICE_UUID,
    UART_TX_CHAR_UUID,
};
use crate::error::LinkError;
use crate::models::LinkConfig;
use crate::protocol::encoder::encode_command;
use crate::protocol::{command_name, to_hex, CommandKey};
use crate::router::{route_notification, short_uuid};
use crate::session::{DeviceInfo, DeviceSession, LogEntry, LogKind, NOT_AVAILABLE};

pub struct Link<T: BleTransport> {
    transport: T,
    session: DeviceSession,
    config: LinkConfig,
    subscriptions: Vec<(&'static str, &'static str)>,
    open: bool,
}

impl<T: BleTransport> Link<T> {
    /// Connect, subscribe to whatever the peripheral lets us, then read the
    /// device information once.
    ///
    /// Only the connection itself is fatal; failed subscriptions and reads are logged.
    pub fn open(
        mut transport: T,
        peripheral_id: &str,
        config: LinkConfig,
    ) -> Result<Self, BleError> {
        let info = transport.connect(peripheral_id)?;
        let session = DeviceSession::from_peripheral(&info, config.log_capacity);
        info!(
            peripheral = peripheral_id,
            protocol_capable = session.is_protocol_capable(),
            "connected"
        );

        let mut link = Self {
            transport,
            session,
            config,
            subscriptions: Vec::new(),
            open: true,
        };
        let label = info.name.as_deref().unwrap_or(peripheral_id).to_string();
        link.session
            .log
            .push(LogKind::System, format!("Connected to {label}"));
        link.subscribe(&info);
        link.refresh_device_info();
        Ok(link)
    }

    fn subscribe(&mut self, info: &PeripheralInfo) {
        let mut targets = Vec::new();
        let notifiable = |service: &str, characteristic: &str| {
            info.characteristic(service, characteristic)
                .is_some_and(|c| c.properties.can_subscribe())
        };
        if notifiable(BATTERY_SERVICE_UUID, BATTERY_LEVEL_CHAR_UUID) {
            targets.push((BATTERY_SERVICE_UUID, BATTERY_LEVEL_CHAR_UUID));
        }
        if self.session.is_protocol_capable() && notifiable(UART_SERVICE_UUID, UART_TX_CHAR_UUID) {
            targets.push((UART_SERVICE_UUID, UART_TX_CHAR_UUID));
        }

        for (service, characteristic) in targets {
            let tag = format!("S:{} C:{}", short_uuid(service), short_uuid(characteristic));
            match self
                .transport
                .start_notification(self.session.peripheral_id(), service, characteristic)
            {
                Ok(()) => {
                    self.subscriptions.push((service, characteristic));
                    self.session
                        .log
                        .push(LogKind::System, format!("Notifications enabled ({tag})"));
                }
                Err(err) => {
                    warn!(%err, service, characteristic, "notification setup failed");
                    self.session
                        .log
                        .push(LogKind::Error, format!("Notifications failed ({tag}): {err}"));
                }
            }
        }
    }

    /// Re-read the device information strings and the battery level.
    ///
    /// Unreadable strings become `N/A`. An unreadable battery keeps the last
    /// known level.
    pub fn read_device_info(&mut self) -> Result<&DeviceInfo, BleError> {
        if !self.open {
            return Err(BleError::NotConnected);
        }
        Ok(self.refresh_device_info())
    }

    fn refresh_device_info(&mut self) -> &DeviceInfo {
        let info = DeviceInfo {
            manufacturer: self.read_info_string(MANUFACTURER_NAME_CHAR_UUID),
            model: self.read_info_string(MODEL_NUMBER_CHAR_UUID),
            serial_number: self.read_info_string(SERIAL_NUMBER_CHAR_UUID),
            hardware_revision: self.read_info_string(HARDWARE_REVISION_CHAR_UUID),
            firmware_revision: self.read_info_string(FIRMWARE_REVISION_CHAR_UUID),
            software_revision: self.read_info_string(SOFTWARE_REVISION_CHAR_UUID),
        };
        let battery = self.transport.read(
            self.session.peripheral_id(),
            BATTERY_SERVICE_UUID,
            BATTERY_LEVEL_CHAR_UUID,
        );
        match battery.as_deref() {
            Ok([level, ..]) => self.session.battery_percent = Some(*level),
            Ok([]) => debug!("empty battery read"),
            Err(err) => debug!(%err, "battery read failed"),
        }

        self.session
            .log
            .push(LogKind::System, format!("Device info: {info}"));
        self.session.device_info.insert(info)
    }

    fn read_info_string(&mut self, characteristic: &str) -> String {
        let result = self.transport.read(
            self.session.peripheral_id(),
            DEVICE_INFO_SERVICE_UUID,
            characteristic,
        );
        match result {
            Ok(value) => String::from_utf8_lossy(&value).into_owned(),
            Err(err) => {
                debug!(%err, characteristic, "device info read failed");
                NOT_AVAILABLE.to_string()
            }
        }
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Feed one event from the transport's notification stream.
    ///
    /// Once closed, events only leave a `System` entry; session state is untouched.
    pub fn handle_notification(&mut self, event: &Notification) -> &LogEntry {
        if !self.open {
            debug!(peripheral = %event.peripheral_id, "notification after close");
            let tag = format!(
                "S:{} C:{}",
                short_uuid(&event.service),
                short_uuid(&event.characteristic)
            );
            return self
                .session
                .log
                .push(LogKind::System, format!("{tag} - ignored, link closed"));
        }
        route_notification(&mut self.session, event)
    }

    /// Write an already encoded frame to the UART RX characteristic.
    pub fn write_frame(&mut self, key: CommandKey, frame: &[u8]) -> Result<(), BleError> {
        let name = command_name(key);
        if !self.open {
            return Err(BleError::NotConnected);
        }
        let result = self.transport.write_without_response(
            self.session.peripheral_id(),
            UART_SERVICE_UUID,
            UART_RX_CHAR_UUID,
            frame,
        );
        match result {
            Ok(()) => {
                self.session.awaiting = Some(key);
                self.session.log.push(
                    LogKind::Sent,
                    format!("Sent: {name} (Hex: {})", to_hex(frame)),
                );
                Ok(())
            }
            Err(err) => {
                warn!(%err, command = %name, "write failed");
                self.session
                    .log
                    .push(LogKind::Error, format!("Write failed: {name}: {err}"));
                Err(err)
            }
        }
    }

    pub fn send_command(&mut self, key: CommandKey, payload: &[u8]) -> Result<(), LinkError> {
        let frame = encode_command(key, payload)?;
        self.write_frame(key, &frame)?;
        Ok(())
    }

    /// Free-text chat with a peer that speaks plain UTF-8 over the UART.
    pub fn send_text(&mut self, text: &str) -> Result<(), BleError> {
        if !self.open {
            return Err(BleError::NotConnected);
        }
        let result = self.transport.write_without_response(
            self.session.peripheral_id(),
            UART_SERVICE_UUID,
            UART_RX_CHAR_UUID,
            text.as_bytes(),
        );
        match result {
            Ok(()) => {
                self.session
                    .log
                    .push(LogKind::Sent, format!("Sent: \"{text}\""));
                Ok(())
            }
            Err(err) => {
                warn!(%err, "text write failed");
                self.session
                    .log
                    .push(LogKind::Error, format!("Write failed: {err}"));
                Err(err)
            }
        }
    }

    /// Tear down subscriptions, then the connection.
    pub fn close(&mut self) -> Result<(), BleError> {
        if !self.open {
            return Ok(());
        }
        for (service, characteristic) in std::mem::take(&mut self.subscriptions) {
            if let Err(err) =
                self.transport
                    .stop_notification(self.session.peripheral_id(), service, characteristic)
            {
                warn!(%err, service, characteristic, "stop notification failed");
            }
        }
        self.open = false;
        let result = self.transport.disconnect(self.session.peripheral_id());
        info!(peripheral = self.session.peripheral_id(), "disconnected");
        self.session.log.push(LogKind::System, "Disconnected");
        result
    }
}
