//! HID service tree: service, characteristics, descriptors.
//!
//! The tree is plain data built once by [`build_hid_service`] and never
//! mutated afterwards. Transports walk it to register attributes; the
//! server walks it to dispatch requests by UUID.
//!
//! Characteristic order is part of the contract: real GATT stacks assign
//! attribute handles in registration order, and centrals cache handles.

use core::ops::BitOr;

use uuid::Uuid;

use super::{
    short_uuid, HID_CONTROL_POINT, HID_INFORMATION, HID_SERVICE, REPORT, REPORT_MAP,
    REPORT_REFERENCE_DESCRIPTOR,
};
use crate::hid::report_map;

/// Number of characteristics in the HID service.
pub const HID_CHARACTERISTIC_COUNT: usize = 4;

/// GATT service declaration type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceType {
    Primary,
    Secondary,
}

/// Characteristic properties bitfield (values as in the ATT declaration).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties(u8);

impl Properties {
    pub const READ: Self = Self(0x02);
    pub const WRITE_NO_RESPONSE: Self = Self(0x04);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Properties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Attribute access permissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Permissions(u8);

impl Permissions {
    pub const READ: Self = Self(0x01);
    pub const WRITE: Self = Self(0x10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// The four characteristics of the HID service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicKind {
    /// Input report channel (read, notify).
    Report,
    /// HID Report Descriptor.
    ReportMap,
    /// HID version, country code and flags.
    HidInformation,
    /// Suspend / exit-suspend commands.
    HidControlPoint,
}

impl CharacteristicKind {
    /// All kinds, in registration order.
    pub const ALL: [Self; HID_CHARACTERISTIC_COUNT] = [
        Self::Report,
        Self::ReportMap,
        Self::HidInformation,
        Self::HidControlPoint,
    ];

    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Report => REPORT,
            Self::ReportMap => REPORT_MAP,
            Self::HidInformation => HID_INFORMATION,
            Self::HidControlPoint => HID_CONTROL_POINT,
        }
    }

    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        match short_uuid(uuid)? {
            0x2A4D => Some(Self::Report),
            0x2A4B => Some(Self::ReportMap),
            0x2A4A => Some(Self::HidInformation),
            0x2A4C => Some(Self::HidControlPoint),
            _ => None,
        }
    }
}

/// The descriptors the server recognises.
///
/// `HidControlPoint` is the subscription toggle: a central enables or
/// disables report notifications by writing the CCCD sentinels against
/// the HID Control Point UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorKind {
    ReportReference,
    HidControlPoint,
}

impl DescriptorKind {
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::ReportReference => REPORT_REFERENCE_DESCRIPTOR,
            Self::HidControlPoint => HID_CONTROL_POINT,
        }
    }

    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        match short_uuid(uuid)? {
            0x2908 => Some(Self::ReportReference),
            0x2A4C => Some(Self::HidControlPoint),
            _ => None,
        }
    }
}

/// A descriptor attached to a characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    pub uuid: Uuid,
    pub permissions: Permissions,
    /// Value fixed at construction, if any.
    pub value: Option<&'static [u8]>,
}

/// A characteristic and its descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Characteristic {
    pub kind: CharacteristicKind,
    pub uuid: Uuid,
    pub properties: Properties,
    pub permissions: Permissions,
    /// Static value; `None` for dynamic or write-only characteristics.
    pub value: Option<&'static [u8]>,
    pub descriptors: &'static [Descriptor],
}

impl Characteristic {
    pub fn descriptor(&self, kind: DescriptorKind) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }
}

/// A GATT service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Service {
    pub uuid: Uuid,
    pub service_type: ServiceType,
    pub characteristics: [Characteristic; HID_CHARACTERISTIC_COUNT],
}

impl Service {
    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind == kind)
    }

    pub fn find_characteristic(&self, uuid: &Uuid) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.uuid == *uuid)
    }

    /// First descriptor with `uuid` anywhere in the service.
    pub fn find_descriptor(&self, uuid: &Uuid) -> Option<&Descriptor> {
        self.characteristics
            .iter()
            .flat_map(|c| c.descriptors.iter())
            .find(|d| d.uuid == *uuid)
    }
}

static REPORT_DESCRIPTORS: [Descriptor; 1] = [Descriptor {
    kind: DescriptorKind::ReportReference,
    uuid: REPORT_REFERENCE_DESCRIPTOR,
    permissions: Permissions::READ.union(Permissions::WRITE),
    value: Some(&report_map::REPORT_REFERENCE),
}];

/// Build the HID service tree.
///
/// Pure and deterministic: every value comes from the static HID tables.
pub fn build_hid_service() -> Service {
    Service {
        uuid: HID_SERVICE,
        service_type: ServiceType::Primary,
        characteristics: [
            Characteristic {
                kind: CharacteristicKind::Report,
                uuid: REPORT,
                properties: Properties::READ | Properties::NOTIFY,
                permissions: Permissions::READ,
                value: None,
                descriptors: &REPORT_DESCRIPTORS,
            },
            Characteristic {
                kind: CharacteristicKind::ReportMap,
                uuid: REPORT_MAP,
                properties: Properties::READ,
                permissions: Permissions::READ,
                value: Some(&report_map::REPORT_MAP),
                descriptors: &[],
            },
            Characteristic {
                kind: CharacteristicKind::HidInformation,
                uuid: HID_INFORMATION,
                properties: Properties::READ,
                permissions: Permissions::READ,
                value: Some(&report_map::HID_INFORMATION),
                descriptors: &[],
            },
            Characteristic {
                kind: CharacteristicKind::HidControlPoint,
                uuid: HID_CONTROL_POINT,
                properties: Properties::WRITE_NO_RESPONSE,
                permissions: Permissions::WRITE,
                value: None,
                descriptors: &[],
            },
        ],
    }
}
