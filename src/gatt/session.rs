//! GATT connection session
//!
//! `Disconnected → Connecting → Connected → Disconnected`, driven by user
//! actions (`connect`, `disconnect`) and peripheral events (`handle_event`).

use crate::error::{ShellError, ShellResult};
use crate::gatt::transport::{DeviceInfo, DeviceRequest, GattTransport};
use crate::gatt::{DEVICE_INFORMATION_SERVICE, MODEL_NUMBER_STRING};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Connection state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Events raised by the peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The GATT server went away
    PeripheralDisconnected,
    /// A subscribed characteristic published a new value
    ValueChanged { characteristic: Uuid, value: Vec<u8> },
}

/// One user's connection to one peripheral
pub struct GattSession {
    transport: Arc<dyn GattTransport>,
    state: ConnectionState,
    device: Option<DeviceInfo>,
    model_number: Option<String>,
    values: HashMap<Uuid, Vec<u8>>,
    status: String,
}

impl GattSession {
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            device: None,
            model_number: None,
            values: HashMap::new(),
            status: "Not connected".to_string(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Model Number String read from Device Information, if the device has one
    pub fn model_number(&self) -> Option<&str> {
        self.model_number.as_deref()
    }

    /// Latest value seen for a characteristic
    pub fn last_value(&self, characteristic: &Uuid) -> Option<&[u8]> {
        self.values.get(characteristic).map(Vec::as_slice)
    }

    /// Human-readable status line
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Pick a device, connect to it and read its model number.
    ///
    /// Connecting while already connected returns the current device.
    pub async fn connect(&mut self) -> ShellResult<DeviceInfo> {
        match self.state {
            ConnectionState::Connected => {
                if let Some(device) = &self.device {
                    return Ok(device.clone());
                }
            }
            ConnectionState::Connecting => {
                return Err(ShellError::Bluetooth(
                    "connection already in progress".to_string(),
                ));
            }
            ConnectionState::Disconnected => {}
        }

        if !self.transport.is_available().await? {
            self.status = "Bluetooth adapter not available on this device.".to_string();
            return Err(ShellError::BluetoothUnavailable);
        }

        self.state = ConnectionState::Connecting;
        self.status = "Scanning...".to_string();

        let device = match self.transport.request_device(&DeviceRequest::default()).await {
            Ok(device) => device,
            Err(e) => return Err(self.fail(e)),
        };

        self.status = format!("Connecting to \"{}\"...", device.display_name());
        if let Err(e) = self.transport.connect(&device).await {
            return Err(self.fail(e));
        }

        self.state = ConnectionState::Connected;
        self.status = format!("Connected to \"{}\"!", device.display_name());
        info!("Connected to {} ({})", device.display_name(), device.id);

        self.model_number = self.read_model_number(&device).await;
        if self.model_number.is_none() {
            self.status = format!(
                "Connected to \"{}\" (device information unavailable)",
                device.display_name()
            );
        }
        self.device = Some(device.clone());
        Ok(device)
    }

    async fn read_model_number(&self, device: &DeviceInfo) -> Option<String> {
        match self
            .transport
            .read(device, DEVICE_INFORMATION_SERVICE, MODEL_NUMBER_STRING)
            .await
        {
            Ok(bytes) => {
                let model = String::from_utf8_lossy(&bytes).to_string();
                debug!("Model number: {}", model);
                Some(model)
            }
            Err(e) => {
                warn!("Could not read Device Information: {}", e);
                None
            }
        }
    }

    fn fail(&mut self, err: ShellError) -> ShellError {
        self.reset();
        self.status = match &err {
            ShellError::BluetoothCancelled => "Scan cancelled or permission denied.".to_string(),
            other => format!("Error: {}", other),
        };
        err
    }

    fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.device = None;
        self.model_number = None;
        self.values.clear();
    }

    /// Disconnect at the user's request. Returns false if already disconnected.
    pub async fn disconnect(&mut self) -> ShellResult<bool> {
        let device = match (&self.state, &self.device) {
            (ConnectionState::Connected, Some(device)) => device.clone(),
            _ => {
                self.status = "Already disconnected.".to_string();
                return Ok(false);
            }
        };

        self.status = "Disconnecting...".to_string();
        self.transport.disconnect(&device).await?;
        self.handle_event(SessionEvent::PeripheralDisconnected);
        Ok(true)
    }

    /// Apply a peripheral event. Returns true if it changed the session.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::PeripheralDisconnected => {
                let Some(device) = self.device.take() else {
                    return false;
                };
                info!("Device {} disconnected", device.display_name());
                self.reset();
                self.status = format!("Disconnected from \"{}\"", device.display_name());
                true
            }
            SessionEvent::ValueChanged {
                characteristic,
                value,
            } => {
                if self.state != ConnectionState::Connected {
                    debug!("Ignoring notification for {} while {}", characteristic, self.state);
                    return false;
                }
                self.values.insert(characteristic, value);
                true
            }
        }
    }

    fn connected_device(&self) -> ShellResult<&DeviceInfo> {
        match (&self.state, &self.device) {
            (ConnectionState::Connected, Some(device)) => Ok(device),
            _ => Err(ShellError::NotConnected),
        }
    }

    /// Read a characteristic and remember its value
    pub async fn read_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
    ) -> ShellResult<Vec<u8>> {
        let device = self.connected_device()?.clone();
        let value = self.transport.read(&device, service, characteristic).await?;
        self.values.insert(characteristic, value.clone());
        Ok(value)
    }

    /// Write a characteristic value
    pub async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> ShellResult<()> {
        let device = self.connected_device()?.clone();
        self.transport
            .write(&device, service, characteristic, value)
            .await
    }

    /// Ask the peripheral to send value-changed events for a characteristic
    pub async fn subscribe(&mut self, service: Uuid, characteristic: Uuid) -> ShellResult<()> {
        let device = self.connected_device()?.clone();
        self.transport
            .start_notifications(&device, service, characteristic)
            .await?;
        debug!("Subscribed to {}", characteristic);
        Ok(())
    }
}
