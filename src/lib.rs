//! hogp-keyboard: a BLE HID-over-GATT keyboard peripheral.
//!
//! The library holds everything that does not touch the radio: the HID
//! tables and report encoder, the GATT profile tree, the GATT server state
//! machine, advertising and the [`HidPeripheral`] that ties them together.
//! It is `no_std`, allocation-free, and runs on the host for tests.
//!
//! Usage: `cargo test --lib` (add `--features log` to see log output
//! through any `log` backend).
//!
//! The nRF52840 firmware in `main.rs` (feature `embedded`) drives the same
//! types from the Nordic S140 SoftDevice.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to later modules.
mod fmt;

pub mod ble;
pub mod config;
pub mod error;
pub mod gatt;
pub mod hid;
pub mod peripheral;

pub use ble::PeerId;
pub use error::{AdvertiseError, BleError, Error};
pub use gatt::{build_hid_service, GattEvent, GattServer, GattStatus, GattTransport, Response};
pub use hid::KeyboardReport;
pub use peripheral::{HidPeripheral, StartReport};

// ═══════════════════════════════════════════════════════════════════════════
// Scenario Tests
// ═══════════════════════════════════════════════════════════════════════════
