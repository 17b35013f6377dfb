//! Unified error type for hogp-keyboard.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging, and `Display` for host-side callers.

use core::fmt;

/// Top-level error type returned at the caller boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The radio / GATT server could not be opened (radio off, resources
    /// exhausted). Fatal for server start.
    TransportUnavailable,

    /// An operation that needs a running GATT server was called before
    /// `start` (or after `stop`).
    NotStarted,

    /// A report was sent while no central is connected.
    NoTarget,

    /// The transport could not accept the notification right now.
    /// Reports are not queued; the caller decides whether to resend.
    TransportBusy,

    /// Advertising could not be started. Non-fatal for the service.
    Advertising(AdvertiseError),

    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),
}

/// Why advertising failed to start.
///
/// Mirrors the failure reasons a platform advertiser reports through its
/// asynchronous start callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertiseError {
    /// No advertiser exists (radio disabled or not supported).
    Unavailable,
    /// The advertising payload exceeds the legacy 31-byte limit.
    DataTooLarge,
    /// No free advertising set.
    TooManyAdvertisers,
    /// Advertising with this configuration is already running.
    AlreadyStarted,
    /// Controller-internal failure.
    Internal,
    /// The controller does not support the requested mode.
    FeatureUnsupported,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Service or attribute registration failed.
    RegisterFailed,
    /// Characteristic notification failed.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<AdvertiseError> for Error {
    fn from(e: AdvertiseError) -> Self {
        Error::Advertising(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportUnavailable => f.write_str("GATT transport unavailable"),
            Error::NotStarted => f.write_str("GATT server not started"),
            Error::NoTarget => f.write_str("no connected central to receive the report"),
            Error::TransportBusy => f.write_str("transport busy, report not sent"),
            Error::Advertising(e) => write!(f, "advertising failed: {}", e),
            Error::Ble(e) => write!(f, "BLE error: {}", e),
        }
    }
}

impl fmt::Display for AdvertiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdvertiseError::Unavailable => "no advertiser available",
            AdvertiseError::DataTooLarge => "advertising data too large",
            AdvertiseError::TooManyAdvertisers => "too many advertisers",
            AdvertiseError::AlreadyStarted => "already started",
            AdvertiseError::Internal => "internal error",
            AdvertiseError::FeatureUnsupported => "feature unsupported",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BleError::Raw(code) => write!(f, "SoftDevice error {:#x}", code),
            BleError::RegisterFailed => f.write_str("attribute registration failed"),
            BleError::NotifyFailed => f.write_str("notification failed"),
        }
    }
}
