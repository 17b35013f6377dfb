//! GATT server side of the HID-over-GATT Profile (HOGP).
//!
//! 1. **Profile** - the immutable service / characteristic / descriptor
//!    tree for the HID service, built from the static HID tables.
//! 2. **Server** - the request-handling state machine: tracks the one
//!    connected central, answers reads and writes, and pushes input
//!    reports as notifications.
//!
//! All UUIDs are Bluetooth SIG 16-bit assigned numbers expanded onto the
//! Bluetooth Base UUID.

pub mod profile;
pub mod server;

pub use profile::{
    build_hid_service, Characteristic, CharacteristicKind, Descriptor, DescriptorKind,
    Permissions, Properties, Service, ServiceType,
};
pub use server::{
    ConnectionState, GattEvent, GattServer, GattStatus, GattTransport, Response, Session,
};

use uuid::Uuid;

/// Bluetooth Base UUID `00000000-0000-1000-8000-00805F9B34FB`.
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Mask of the bits a 16-bit assigned number occupies.
const SHORT_MASK: u128 = 0xFFFF_FFFF << 96;

/// Expand a 16-bit SIG assigned number onto the Bluetooth Base UUID.
pub const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(BASE_UUID | ((short as u128) << 96))
}

/// The 16-bit assigned number of `uuid`, if it lives on the Base UUID.
pub const fn short_uuid(uuid: &Uuid) -> Option<u16> {
    let raw = uuid.as_u128();
    if raw & !SHORT_MASK != BASE_UUID || raw >> 112 != 0 {
        return None;
    }
    Some((raw >> 96) as u16)
}

/// HID Service.
pub const HID_SERVICE: Uuid = sig_uuid(0x1812);
/// Report characteristic.
pub const REPORT: Uuid = sig_uuid(0x2A4D);
/// Report Reference descriptor.
pub const REPORT_REFERENCE_DESCRIPTOR: Uuid = sig_uuid(0x2908);
/// Report Map characteristic.
pub const REPORT_MAP: Uuid = sig_uuid(0x2A4B);
/// HID Information characteristic.
pub const HID_INFORMATION: Uuid = sig_uuid(0x2A4A);
/// HID Control Point characteristic.
pub const HID_CONTROL_POINT: Uuid = sig_uuid(0x2A4C);
