//! Bluetooth Low Energy peripheral plumbing.
//!
//! 1. **Advertising data** - encodes the legacy AD payload (flags, HID
//!    service UUID, local name) and parses it back for checks.
//! 2. **Advertiser** - the connectable-advertising state machine on top of
//!    an [`AdvertisingBackend`].
//!
//! The GATT side lives in [`crate::gatt`].

pub mod adv_data;
pub mod advertiser;

pub use adv_data::{contains_service_uuid, extract_device_name, AdvertisementData};
pub use advertiser::{
    AdvertiseMode, AdvertiseSettings, Advertiser, AdvertiserState, AdvertisingBackend,
    AdvertisingEvent, TxPowerLevel,
};

use core::fmt;

/// Identity of a remote central: its 48-bit BLE device address, stored
/// least-significant byte first as it appears on air.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerId(pub [u8; 6]);

impl PeerId {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_displays_most_significant_first() {
        let id = PeerId::new([0x66, 0x55, 0x44, 0x33, 0x22, 0xC1]);
        assert_eq!(std::format!("{}", id), "C1:22:33:44:55:66");
    }
}
