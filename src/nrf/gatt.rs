//! HID service registration and the SoftDevice [`GattTransport`].
//!
//! The SoftDevice owns the attribute table and answers reads of static
//! values itself, so the profile tree is registered once at boot. Writes
//! the core cares about (the Report CCCD and the HID Control Point) come
//! back through [`HidServer`] and are turned into [`GattEvent`]s.

use defmt::{debug, info, warn};
use hogp_keyboard::gatt::{
    short_uuid, Characteristic, CharacteristicKind, Permissions, Properties, Service,
    HID_CONTROL_POINT,
};
use hogp_keyboard::hid::KEYBOARD_REPORT_SIZE;
use hogp_keyboard::{BleError, Error, GattEvent, GattTransport, PeerId};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{self, Attribute, Metadata};
use nrf_softdevice::ble::gatt_server::{self, NotifyValueError, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::{RawError, Softdevice};

/// Initial value of the Report characteristic.
static EMPTY_REPORT: [u8; KEYBOARD_REPORT_SIZE] = [0; KEYBOARD_REPORT_SIZE];
/// Initial value of the HID Control Point.
static CONTROL_POINT_INIT: [u8; 1] = [0];

/// Attribute handles assigned by the SoftDevice.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct HidHandles {
    pub report: u16,
    pub report_cccd: u16,
    pub report_reference: u16,
    pub report_map: u16,
    pub hid_information: u16,
    pub control_point: u16,
}

fn sd_uuid(uuid: &uuid::Uuid) -> Result<Uuid, BleError> {
    short_uuid(uuid)
        .map(Uuid::new_16)
        .ok_or(BleError::RegisterFailed)
}

fn sd_properties(props: Properties) -> characteristic::Properties {
    let mut p = characteristic::Properties::new();
    if props.contains(Properties::READ) {
        p = p.read();
    }
    if props.contains(Properties::WRITE) {
        p = p.write();
    }
    if props.contains(Properties::WRITE_NO_RESPONSE) {
        p = p.write_without_response();
    }
    if props.contains(Properties::NOTIFY) {
        p = p.notify();
    }
    p
}

fn sd_attribute(value: &'static [u8], perms: Permissions) -> Attribute<&'static [u8]> {
    let mut attr = Attribute::new(value);
    if !perms.contains(Permissions::READ) {
        attr = attr.read_security(SecurityMode::NoAccess);
    }
    if !perms.contains(Permissions::WRITE) {
        attr = attr.write_security(SecurityMode::NoAccess);
    }
    attr
}

fn initial_value(c: &Characteristic) -> &'static [u8] {
    match (c.value, c.kind) {
        (Some(value), _) => value,
        (None, CharacteristicKind::Report) => &EMPTY_REPORT,
        (None, _) => &CONTROL_POINT_INIT,
    }
}

/// Register `service` with the SoftDevice, in tree order.
pub fn register(sd: &mut Softdevice, service: &Service) -> Result<HidHandles, BleError> {
    let registered = |e: RegisterError| {
        warn!("GATT registration failed: {:?}", e);
        BleError::RegisterFailed
    };

    let mut sb = ServiceBuilder::new(sd, sd_uuid(&service.uuid)?).map_err(registered)?;
    let mut handles = HidHandles {
        report: 0,
        report_cccd: 0,
        report_reference: 0,
        report_map: 0,
        hid_information: 0,
        control_point: 0,
    };

    for c in &service.characteristics {
        let mut cb = sb
            .add_characteristic(
                sd_uuid(&c.uuid)?,
                sd_attribute(initial_value(c), c.permissions),
                Metadata::new(sd_properties(c.properties)),
            )
            .map_err(registered)?;

        for d in c.descriptors {
            // Fixed descriptor values never take writes from the central.
            let attr = match d.value {
                Some(value) => sd_attribute(value, d.permissions)
                    .write_security(SecurityMode::NoAccess),
                None => sd_attribute(&[], d.permissions),
            };
            let dh = cb
                .add_descriptor(sd_uuid(&d.uuid)?, attr)
                .map_err(registered)?;
            if c.kind == CharacteristicKind::Report {
                handles.report_reference = dh.handle();
            }
        }

        let ch = cb.build();
        match c.kind {
            CharacteristicKind::Report => {
                handles.report = ch.value_handle;
                handles.report_cccd = ch.cccd_handle;
            }
            CharacteristicKind::ReportMap => handles.report_map = ch.value_handle,
            CharacteristicKind::HidInformation => handles.hid_information = ch.value_handle,
            CharacteristicKind::HidControlPoint => handles.control_point = ch.value_handle,
        }
    }

    let _ = sb.build();
    info!("HID service registered: {:?}", handles);
    Ok(handles)
}

/// Writes from the central the core reacts to.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub enum HidWrite {
    /// Report CCCD, raw little-endian value.
    Subscription([u8; 2]),
    ControlPoint(u8),
}

impl HidWrite {
    /// Hand the write to the core as the matching [`GattEvent`].
    pub fn dispatch(self, device: PeerId) {
        super::with_keyboard(|k| match self {
            HidWrite::Subscription(value) => {
                k.on_gatt_event(GattEvent::DescriptorWrite {
                    device,
                    uuid: HID_CONTROL_POINT,
                    value: &value,
                });
            }
            HidWrite::ControlPoint(value) => {
                k.on_gatt_event(GattEvent::CharacteristicWrite {
                    device,
                    uuid: HID_CONTROL_POINT,
                    value: &[value],
                });
            }
        });
    }
}

/// `gatt_server::Server` over the registered HID handles.
pub struct HidServer {
    handles: HidHandles,
}

impl HidServer {
    pub const fn new(handles: HidHandles) -> Self {
        Self { handles }
    }
}

impl gatt_server::Server for HidServer {
    type Event = HidWrite;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle == self.handles.report_cccd {
            match data {
                [lo, hi] => Some(HidWrite::Subscription([*lo, *hi])),
                _ => {
                    warn!("Malformed CCCD write: {:?}", data);
                    None
                }
            }
        } else if handle == self.handles.control_point {
            match data {
                [value] => Some(HidWrite::ControlPoint(*value)),
                _ => {
                    warn!("Malformed HID control point write: {:?}", data);
                    None
                }
            }
        } else {
            debug!("Ignoring write to handle {}", handle);
            None
        }
    }
}

pub fn peer_id(conn: &Connection) -> PeerId {
    PeerId::new(conn.peer_address().bytes())
}

/// [`GattTransport`] backed by the SoftDevice.
pub struct SdGatt {
    handles: Option<HidHandles>,
    conn: Option<Connection>,
    open: bool,
}

impl SdGatt {
    pub const fn new() -> Self {
        Self {
            handles: None,
            conn: None,
            open: false,
        }
    }

    pub fn set_handles(&mut self, handles: HidHandles) {
        self.handles = Some(handles);
    }

    /// Track the link a central just opened.
    pub fn attach(&mut self, conn: Connection) {
        self.conn = Some(conn);
    }

    pub fn detach(&mut self) {
        self.conn = None;
    }
}

impl GattTransport for SdGatt {
    fn open(&mut self, _service: &Service) -> Result<(), Error> {
        if self.handles.is_none() {
            warn!("HID service was not registered");
            return Err(Error::TransportUnavailable);
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.disconnect() {
                warn!("Disconnect failed: {:?}", e);
            }
        }
    }

    fn notify(
        &mut self,
        device: &PeerId,
        characteristic: &Characteristic,
        value: &[u8],
    ) -> Result<(), Error> {
        if !self.open {
            return Err(Error::NotStarted);
        }
        let handles = self.handles.ok_or(Error::NotStarted)?;
        let conn = self
            .conn
            .as_ref()
            .filter(|c| peer_id(c) == *device)
            .ok_or(Error::NoTarget)?;

        let handle = match characteristic.kind {
            CharacteristicKind::Report => handles.report,
            _ => return Err(BleError::NotifyFailed.into()),
        };

        gatt_server::notify_value(conn, handle, value).map_err(|e| match e {
            NotifyValueError::Disconnected => Error::NoTarget,
            NotifyValueError::Raw(RawError::Resources | RawError::Busy) => Error::TransportBusy,
            NotifyValueError::Raw(raw) => {
                warn!("Notify failed: {:?}", raw);
                BleError::Raw(raw as u32).into()
            }
        })
    }
}
