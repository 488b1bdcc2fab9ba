//! Bluetooth GATT client session
//!
//! Connects to a peripheral, reads and writes characteristics and tracks
//! notifications through an explicit session state machine.
//!
//! Library-only: the CLI does not reach this module. Embedders supply a
//! platform `GattTransport` (adapter check, device picker, GATT client,
//! notifications) and drive a `GattSession` with it.

pub mod session;
pub mod transport;

pub use session::{ConnectionState, GattSession, SessionEvent};
pub use transport::{DeviceInfo, DeviceRequest, GattTransport};

use uuid::Uuid;

/// Bluetooth SIG base UUID with the 16-bit short ID in bits 96..112
const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_0080_5f9b_34fb)
}

/// Service with a characteristic that publishes time series data
pub const TIME_SERIES_SERVICE: Uuid = Uuid::from_u128(0xfe0fadc2_a9dc_4566_96f5_dd8a4934dac2);

/// Time series data characteristic
pub const TIME_SERIES_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xcba1d466_344c_4be3_ab3f_189f80dd7518);

pub const DEVICE_INFORMATION_SERVICE: Uuid = sig_uuid(0x180a);
pub const MODEL_NUMBER_STRING: Uuid = sig_uuid(0x2a24);
pub const BATTERY_SERVICE: Uuid = sig_uuid(0x180f);
