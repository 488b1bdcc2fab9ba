//! Bluetooth transport abstraction
//!
//! The platform Bluetooth stack (device picker, pairing, GATT client) sits
//! behind this trait so the session logic can run against any backend.

use crate::error::ShellResult;
use crate::gatt::{BATTERY_SERVICE, DEVICE_INFORMATION_SERVICE, TIME_SERIES_SERVICE};
use async_trait::async_trait;
use uuid::Uuid;

/// A peripheral chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: Option<String>,
}

impl DeviceInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Device")
    }
}

/// Options passed to the device picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    /// Offer every discoverable device
    pub accept_all_devices: bool,

    /// Services a device must advertise (ignored when accepting all)
    pub filters: Vec<Uuid>,

    /// Services the session intends to access after connecting
    pub optional_services: Vec<Uuid>,
}

impl Default for DeviceRequest {
    fn default() -> Self {
        Self {
            accept_all_devices: true,
            filters: vec![],
            optional_services: vec![
                BATTERY_SERVICE,
                DEVICE_INFORMATION_SERVICE,
                TIME_SERIES_SERVICE,
            ],
        }
    }
}

/// Platform Bluetooth stack
///
/// `request_device` returns `ShellError::BluetoothCancelled` when the user
/// dismisses the picker or denies permission.
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Check whether an adapter is present and powered
    async fn is_available(&self) -> ShellResult<bool>;

    /// Let the user pick a device
    async fn request_device(&self, request: &DeviceRequest) -> ShellResult<DeviceInfo>;

    /// Connect to the device's GATT server
    async fn connect(&self, device: &DeviceInfo) -> ShellResult<()>;

    /// Disconnect from the device's GATT server
    async fn disconnect(&self, device: &DeviceInfo) -> ShellResult<()>;

    /// Read a characteristic value
    async fn read(&self, device: &DeviceInfo, service: Uuid, characteristic: Uuid) -> ShellResult<Vec<u8>>;

    /// Write a characteristic value
    async fn write(
        &self,
        device: &DeviceInfo,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> ShellResult<()>;

    /// Enable value-changed notifications for a characteristic
    async fn start_notifications(
        &self,
        device: &DeviceInfo,
        service: Uuid,
        characteristic: Uuid,
    ) -> ShellResult<()>;
}
