//! Connectable advertising.
//!
//! `start_advertising` only *requests* advertising; the backend reports
//! the outcome later through [`AdvertisingEvent`], fed back with
//! [`Advertiser::on_event`].
//!
//! ```text
//!   Idle ──start──▶ Starting ──Started──▶ Advertising
//!    ▲                 │                      │
//!    │            StartFailed                 │
//!    │                 ▼                      │
//!    └──stop──── Failed(reason) ◀─────────────┘ (stop from any state → Idle)
//! ```
//!
//! A central connecting ends advertising on the controller. The request
//! stays latched, so `Paused` drops back to `Starting` and the next
//! `Started` (after the link closes) returns to `Advertising`.

use uuid::Uuid;

use super::adv_data::AdvertisementData;
use crate::config::{ADV_INTERVAL, ADV_TIMEOUT};
use crate::error::AdvertiseError;
use crate::gatt::short_uuid;

/// Advertising interval class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertiseMode {
    LowPower,
    Balanced,
    LowLatency,
}

impl AdvertiseMode {
    /// Interval in 0.625 ms units.
    pub const fn interval(self) -> u32 {
        match self {
            Self::LowPower => 1600,
            Self::Balanced => ADV_INTERVAL,
            Self::LowLatency => 160,
        }
    }
}

/// Transmit power class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

impl TxPowerLevel {
    /// Nominal output power in dBm.
    pub const fn dbm(self) -> i8 {
        match self {
            Self::UltraLow => -21,
            Self::Low => -15,
            Self::Medium => crate::config::ADV_TX_POWER_DBM,
            Self::High => 1,
        }
    }
}

/// Parameters handed to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertiseSettings {
    pub mode: AdvertiseMode,
    pub tx_power: TxPowerLevel,
    pub connectable: bool,
    /// In 10 ms units; `None` advertises until stopped.
    pub timeout: Option<u16>,
    /// Whether the TX power level AD structure is sent.
    pub include_tx_power: bool,
}

impl AdvertiseSettings {
    /// Connectable, balanced interval, medium power, no timeout.
    pub const fn keyboard() -> Self {
        Self {
            mode: AdvertiseMode::Balanced,
            tx_power: TxPowerLevel::Medium,
            connectable: true,
            timeout: ADV_TIMEOUT,
            include_tx_power: false,
        }
    }
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self::keyboard()
    }
}

/// Outcome reported asynchronously by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingEvent {
    Started,
    StartFailed(AdvertiseError),
    /// A central connected and the controller stopped advertising.
    Paused,
}

/// The radio-side advertiser.
pub trait AdvertisingBackend {
    /// Request advertising. An `Err` is an immediate rejection; success
    /// still arrives later as [`AdvertisingEvent::Started`].
    fn start(
        &mut self,
        settings: &AdvertiseSettings,
        data: &AdvertisementData,
    ) -> Result<(), AdvertiseError>;

    fn stop(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertiserState {
    Idle,
    Starting,
    Advertising,
    Failed(AdvertiseError),
}

pub struct Advertiser<B: AdvertisingBackend> {
    backend: B,
    settings: AdvertiseSettings,
    state: AdvertiserState,
}

impl<B: AdvertisingBackend> Advertiser<B> {
    pub const fn new(backend: B) -> Self {
        Self::with_settings(backend, AdvertiseSettings::keyboard())
    }

    pub const fn with_settings(backend: B, settings: AdvertiseSettings) -> Self {
        Self {
            backend,
            settings,
            state: AdvertiserState::Idle,
        }
    }

    pub fn state(&self) -> AdvertiserState {
        self.state
    }

    pub fn settings(&self) -> &AdvertiseSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            AdvertiserState::Starting | AdvertiserState::Advertising
        )
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Request connectable advertising of `service_uuid` under
    /// `device_name`.
    ///
    /// Only 16-bit SIG service UUIDs can be advertised.
    pub fn start_advertising(
        &mut self,
        service_uuid: &Uuid,
        device_name: &str,
    ) -> Result<(), AdvertiseError> {
        if self.is_active() {
            warn!("Advertising already started");
            return Err(AdvertiseError::AlreadyStarted);
        }

        let Some(short) = short_uuid(service_uuid) else {
            return Err(self.fail(AdvertiseError::FeatureUnsupported));
        };
        let data = match AdvertisementData::encode(short, device_name) {
            Ok(data) => data,
            Err(e) => return Err(self.fail(e)),
        };

        if let Err(e) = self.backend.start(&self.settings, &data) {
            return Err(self.fail(e));
        }

        debug!(
            "Advertising requested (service {:#x}, {} byte payload)",
            short,
            data.len()
        );
        self.state = AdvertiserState::Starting;
        Ok(())
    }

    pub fn on_started(&mut self) {
        match self.state {
            AdvertiserState::Starting => {
                info!("LE Advertise Started.");
                self.state = AdvertiserState::Advertising;
            }
            state => debug!("Ignoring advertising start in state {:?}", state),
        }
    }

    pub fn on_start_failed(&mut self, reason: AdvertiseError) {
        match self.state {
            AdvertiserState::Starting => {
                self.fail(reason);
            }
            state => debug!("Ignoring advertising failure in state {:?}", state),
        }
    }

    /// Advertising ended because a central connected.
    pub fn on_paused(&mut self) {
        match self.state {
            AdvertiserState::Advertising => {
                debug!("Advertising paused while connected");
                self.state = AdvertiserState::Starting;
            }
            state => debug!("Ignoring advertising pause in state {:?}", state),
        }
    }

    pub fn on_event(&mut self, event: AdvertisingEvent) {
        match event {
            AdvertisingEvent::Started => self.on_started(),
            AdvertisingEvent::StartFailed(reason) => self.on_start_failed(reason),
            AdvertisingEvent::Paused => self.on_paused(),
        }
    }

    /// Stop advertising. A no-op unless advertising was requested.
    pub fn stop_advertising(&mut self) {
        if self.is_active() {
            self.backend.stop();
            info!("Advertising stopped");
        }
        self.state = AdvertiserState::Idle;
    }

    fn fail(&mut self, reason: AdvertiseError) -> AdvertiseError {
        warn!("LE Advertise Failed: {:?}", reason);
        self.state = AdvertiserState::Failed(reason);
        reason
    }
}
