pub use crate::error::BleError;

/// Standard battery service.
pub const BATTERY_SERVICE_UUID: &str = "180F";
/// Standard battery level characteristic.
pub const BATTERY_LEVEL_CHAR_UUID: &str = "2A19";

/// Standard device information service; every characteristic is a UTF-8 string.
pub const DEVICE_INFO_SERVICE_UUID: &str = "180A";
pub const MANUFACTURER_NAME_CHAR_UUID: &str = "2A29";
pub const MODEL_NUMBER_CHAR_UUID: &str = "2A24";
pub const SERIAL_NUMBER_CHAR_UUID: &str = "2A25";
pub const FIRMWARE_REVISION_CHAR_UUID: &str = "2A26";
pub const HARDWARE_REVISION_CHAR_UUID: &str = "2A27";
pub const SOFTWARE_REVISION_CHAR_UUID: &str = "2A28";

/// Vendor UART service carrying FitPro frames.
pub const UART_SERVICE_UUID: &str = "6e400001-b5a3-f393-e0a9-e50e24dcca9d";
/// The app writes commands here.
pub const UART_RX_CHAR_UUID: &str = "6e400002-b5a3-f393-e0a9-e50e24dcca9d";
/// The peripheral notifies responses here.
pub const UART_TX_CHAR_UUID: &str = "6e400003-b5a3-f393-e0a9-e50e24dcca9d";

/// UUID comparison as the platforms report them: case-insensitive, exact.
pub fn uuid_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacteristicProperties {
    pub read: bool,
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool,
    pub indicate: bool,
}

impl CharacteristicProperties {
    pub fn can_subscribe(&self) -> bool {
        self.notify || self.indicate
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub service: String,
    pub characteristic: String,
    pub properties: CharacteristicProperties,
}

/// Metadata the transport reports for a connected peripheral.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeripheralInfo {
    pub id: String,
    pub name: Option<String>,
    pub advertised_services: Vec<String>,
    pub characteristics: Vec<CharacteristicInfo>,
}

impl PeripheralInfo {
    pub fn characteristic(
        &self,
        service: &str,
        characteristic: &str,
    ) -> Option<&CharacteristicInfo> {
        self.characteristics
            .iter()
            .find(|c| uuid_eq(&c.service, service) && uuid_eq(&c.characteristic, characteristic))
    }
}

/// One value-changed event from the transport's notification stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub peripheral_id: String,
    pub service: String,
    pub characteristic: String,
    pub value: Vec<u8>,
}

impl Notification {
    pub fn is_from(&self, service: &str, characteristic: &str) -> bool {
        uuid_eq(&self.service, service) && uuid_eq(&self.characteristic, characteristic)
    }
}

/// The native BLE stack as seen from the protocol core.
///
/// Inbound notifications are not pulled through this trait; the host pushes
/// them into [`Link::handle_notification`](crate::connection::Link::handle_notification).
pub trait BleTransport {
    fn connect(&mut self, peripheral_id: &str) -> Result<PeripheralInfo, BleError>;
    fn disconnect(&mut self, peripheral_id: &str) -> Result<(), BleError>;

    fn read(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<Vec<u8>, BleError>;

    fn write(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
        data: &[u8],
    ) -> Result<(), BleError>;
    fn write_without_response(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
        data: &[u8],
    ) -> Result<(), BleError>;

    fn start_notification(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<(), BleError>;
    fn stop_notification(
        &mut self,
        peripheral_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<(), BleError>;
}
