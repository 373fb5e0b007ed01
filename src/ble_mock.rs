use crate::ble::{
    uuid_eq, BleError, BleTransport, CharacteristicInfo, CharacteristicProperties,
    PeripheralInfo, BATTERY_LEVEL_CHAR_UUID, BATTERY_SERVICE_UUID, DEVICE_INFO_SERVICE_UUID,
    FIRMWARE_REVISION_CHAR_UUID, MANUFACTURER_NAME_CHAR_UUID, MODEL_NUMBER_CHAR_UUID,
    UART_RX_CHAR_UUID, UART_SERVICE_UUID, UART_TX_CHAR_UUID,
};

/// A readable value served by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockValue {
    pub peripheral_id: String,
    pub service: String,
    pub characteristic: String,
    pub data: Vec<u8>,
}

impl MockValue {
    fn new(peripheral_id: &str, service: &str, characteristic: &str, data: &[u8]) -> Self {
        Self {
            peripheral_id: peripheral_id.to_string(),
            service: service.to_string(),
            characteristic: characteristic.to_string(),
            data: data.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockWrite {
    pub peripheral_id: String,
    pub service: String,
    pub characteristic: String,
    pub data: Vec<u8>,
    pub with_response: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    pub peripherals: Vec<PeripheralInfo>,
    /// Characteristics without an entry here fail to read.
    pub values: Vec<MockValue>,
    pub connected: Option<String>,
    pub writes: Vec<MockWrite>,
    pub subscriptions: Vec<(String, String)>,
    /// Writes with this zero-based index (and later) fail.
    pub fail_writes_from: Option<usize>,
    pub fail_subscriptions: bool,
    pub fail_connect: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_data() -> Self {
        let notify = CharacteristicProperties {
            read: true,
            notify: true,
            ..Default::default()
        };
        Self {
            peripherals: vec![
                PeripheralInfo {
                    id: "mock-band-1".to_string(),
                    name: Some("LT716".to_string()),
                    advertised_services: vec![
                        UART_SERVICE_UUID.to_uppercase(),
                        BATTERY_SERVICE_UUID.to_string(),
                    ],
                    characteristics: vec![
                        CharacteristicInfo {
                            service: UART_SERVICE_UUID.to_string(),
                            characteristic: UART_TX_CHAR_UUID.to_string(),
                            properties: notify,
                        },
                        CharacteristicInfo {
                            service: UART_SERVICE_UUID.to_string(),
                            characteristic: UART_RX_CHAR_UUID.to_string(),
                            properties: CharacteristicProperties {
                                write: true,
                                write_without_response: true,
                                ..Default::default()
                            },
                        },
                        CharacteristicInfo {
                            service: BATTERY_SERVICE_UUID.to_string(),
                            characteristic: BATTERY_LEVEL_CHAR_UUID.to_string(),
                            properties: notify,
                        },
                    ],
                },
                PeripheralInfo {
                    id: "mock-speaker-1".to_string(),
                    name: Some("JBL Flip".to_string()),
                    advertised_services: vec![BATTERY_SERVICE_UUID.to_string()],
                    characteristics: vec![CharacteristicInfo {
                        service: BATTERY_SERVICE_UUID.to_string(),
                        characteristic: BATTERY_LEVEL_CHAR_UUID.to_string(),
                        properties: CharacteristicProperties {
                            read: true,
                            ..Default::default()
                        },
                    }],
                },
            ],
            values: vec![
                MockValue::new(
                    "mock-band-1",
                    DEVICE_INFO_SERVICE_UUID,
                    MANUFACTURER_NAME_CHAR_UUID,
                    b"FitPro",
                ),
                MockValue::new(
                    "mock-band-1",
                    DEVICE_INFO_SERVICE_UUID,
                    MODEL_NUMBER_CHAR_UUID,
                    b"LT716",
                ),
                MockValue::new(
                    "mock-band-1",
                    DEVICE_INFO_SERVICE_UUID,
                    FIRMWARE_REVISION_CHAR_UUID,
                    b"V1.2.3",
                ),
                MockValue::new(
                    "mock-band-1",
                    BATTERY_SERVICE_UUID,
                    BATTERY_LEVEL_CHAR_UUID,
                    &[76],
                ),
                MockValue::new(
                    "mock-speaker-1",
                    BATTERY_SERVICE_UUID,
                    BATTERY_LEVEL_CHAR_UUID,
                    &[90],
                ),
            ],
            ..Default::default()
        }
    }

    fn require_connected(&self, peripheral_id: &str) -> Result<(), BleError> {
        match &self.connected {
            Some(id) if id == peripheral_id => Ok(()),
            _ => Err(BleError::NotConnected),
        }
    }

    fn record_write(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
        data: &[u8],
        with_response: bool,
    ) -> Result<(), BleError> {
        self.require_connected(peripheral_id)?;
        let index = self.writes.len();
        if self.fail_writes_from.is_some_and(|from| index >= from) {
            return Err(BleError::WriteFailed(format!("mock write {index} rejected")));
        }
        self.writes.push(MockWrite {
            peripheral_id: peripheral_id.to_string(),
            service: service.to_string(),
            characteristic: characteristic.to_string(),
            data: data.to_vec(),
            with_response,
        });
        Ok(())
    }
}

impl BleTransport for MockTransport {
    fn connect(&mut self, peripheral_id: &str) -> Result<PeripheralInfo, BleError> {
        if self.fail_connect {
            return Err(BleError::ConnectionFailed);
        }
        let info = self
            .peripherals
            .iter()
            .find(|p| p.id == peripheral_id)
            .cloned()
            .ok_or(BleError::DeviceNotFound)?;
        self.connected = Some(peripheral_id.to_string());
        Ok(info)
    }

    fn disconnect(&mut self, peripheral_id: &str) -> Result<(), BleError> {
        self.require_connected(peripheral_id)?;
        self.connected = None;
        self.subscriptions.clear();
        Ok(())
    }

    fn read(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<Vec<u8>, BleError> {
        self.require_connected(peripheral_id)?;
        self.values
            .iter()
            .find(|v| {
                v.peripheral_id == peripheral_id
                    && uuid_eq(&v.service, service)
                    && uuid_eq(&v.characteristic, characteristic)
            })
            .map(|v| v.data.clone())
            .ok_or_else(|| BleError::GattError(format!("{characteristic} is not readable")))
    }

    fn write(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
        data: &[u8],
    ) -> Result<(), BleError> {
        self.record_write(peripheral_id, service, characteristic, data, true)
    }

    fn write_without_response(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
        data: &[u8],
    ) -> Result<(), BleError> {
        self.record_write(peripheral_id, service, characteristic, data, false)
    }

    fn start_notification(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<(), BleError> {
        self.require_connected(peripheral_id)?;
        if self.fail_subscriptions {
            return Err(BleError::NotificationFailed(characteristic.to_string()));
        }
        self.subscriptions
            .push((service.to_string(), characteristic.to_string()));
        Ok(())
    }

    fn stop_notification(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<(), BleError> {
        self.require_connected(peripheral_id)?;
        self.subscriptions
            .retain(|(s, c)| !(s == service && c == characteristic));
        Ok(())
    }
}
