//! The caller-facing HID peripheral.
//!
//! Ties the [`Advertiser`] and the [`GattServer`] together behind the three
//! operations an application needs: `start_service`, `stop_service` and
//! `send_key_code`. Transport callbacks are forwarded through
//! [`HidPeripheral::on_gatt_event`] and
//! [`HidPeripheral::on_advertising_event`].
//!
//! The peripheral is a plain `&mut self` state machine. When callbacks and
//! application calls come from different tasks, wrap it in one mutex so
//! `stop_service` can never interleave with a running handler.

use crate::ble::{AdvertiseSettings, Advertiser, AdvertiserState, AdvertisingBackend, AdvertisingEvent};
use crate::config::DEVICE_NAME;
use crate::error::{AdvertiseError, Error};
use crate::gatt::{build_hid_service, GattEvent, GattServer, GattTransport, Response, HID_SERVICE};

/// Outcome of [`HidPeripheral::start_service`].
///
/// The GATT server is running whenever a report is returned; advertising
/// failures are reported here instead of failing the whole start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartReport {
    /// `Ok` once advertising was requested from the backend.
    pub advertising: Result<(), AdvertiseError>,
}

impl StartReport {
    pub fn is_advertising(&self) -> bool {
        self.advertising.is_ok()
    }
}

pub struct HidPeripheral<A: AdvertisingBackend, T: GattTransport> {
    advertiser: Advertiser<A>,
    server: GattServer<T>,
    device_name: &'static str,
}

impl<A: AdvertisingBackend, T: GattTransport> HidPeripheral<A, T> {
    pub const fn new(advertising: A, transport: T) -> Self {
        Self::with_name(advertising, transport, DEVICE_NAME)
    }

    pub const fn with_name(advertising: A, transport: T, device_name: &'static str) -> Self {
        Self {
            advertiser: Advertiser::with_settings(advertising, AdvertiseSettings::keyboard()),
            server: GattServer::new(transport),
            device_name,
        }
    }

    /// Start advertising, then bring up the GATT server.
    ///
    /// Fails only when the server cannot be opened; advertising is then
    /// withdrawn again so nothing is left half started.
    pub fn start_service(&mut self) -> Result<StartReport, Error> {
        if self.server.is_started() {
            debug!("HID service already running");
            return Ok(StartReport {
                advertising: match self.advertiser.state() {
                    AdvertiserState::Failed(reason) => Err(reason),
                    _ => Ok(()),
                },
            });
        }

        let advertising = self
            .advertiser
            .start_advertising(&HID_SERVICE, self.device_name);
        if let Err(e) = advertising {
            warn!("Continuing without advertising: {:?}", e);
        }

        if let Err(e) = self.server.start(build_hid_service()) {
            self.advertiser.stop_advertising();
            return Err(e);
        }

        info!("HID service started");
        Ok(StartReport { advertising })
    }

    /// Close the GATT server, then stop advertising. Idempotent.
    pub fn stop_service(&mut self) {
        self.server.stop();
        self.advertiser.stop_advertising();
    }

    /// Send `key_code` as a keyboard input report to the connected central.
    pub fn send_key_code(&mut self, key_code: u8) -> Result<(), Error> {
        self.server.send_key_code(key_code)
    }

    pub fn on_gatt_event(&mut self, event: GattEvent<'_>) -> Option<Response> {
        self.server.dispatch(event)
    }

    pub fn on_advertising_event(&mut self, event: AdvertisingEvent) {
        self.advertiser.on_event(event);
    }

    pub fn server(&self) -> &GattServer<T> {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut GattServer<T> {
        &mut self.server
    }

    pub fn advertiser(&self) -> &Advertiser<A> {
        &self.advertiser
    }

    pub fn advertiser_mut(&mut self) -> &mut Advertiser<A> {
        &mut self.advertiser
    }
}
