//! Application-wide constants and compile-time configuration.
//!
//! Advertising parameters, device identity, and firmware key bindings
//! live here so they can be tuned in one place.

// BLE identity

/// GAP device name, included in the advertising payload.
pub const DEVICE_NAME: &str = "HOGP Keyboard";

// Advertising
//
// The three settings below are the "balanced / medium / forever"
// profile: a connectable undirected advertisement that runs until it is
// explicitly stopped or a central connects.

/// Advertising interval (in 0.625 ms units). 400 = 250 ms (balanced mode).
pub const ADV_INTERVAL: u32 = 400;

/// Advertising timeout (in 10 ms units). `None` = advertise indefinitely.
pub const ADV_TIMEOUT: Option<u16> = None;

/// Requested transmit power (dBm) for the medium power level.
pub const ADV_TX_POWER_DBM: i8 = -7;

/// Legacy advertising PDU payload limit (bytes).
pub const ADV_PAYLOAD_MAX: usize = 31;

// GATT

/// ATT MTU requested from the SoftDevice. 23 is the BLE minimum; the
/// Report Map (65 bytes) then needs Read Blob requests to be fetched.
pub const ATT_MTU: u16 = 23;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button 1 → P0.11
//   Button 2 → P0.12
//   Button 3 → P0.24
//   Button 4 → P0.25

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// HID usage codes sent by the four DK buttons (Keyboard/Keypad page):
/// `a`, `b`, `Enter`, `Space`.
pub const BUTTON_KEY_CODES: [u8; 4] = [0x04, 0x05, 0x28, 0x2C];
