//! GATT server state machine for the HID service.
//!
//! The server owns the registered [`Service`] tree and the single tracked
//! connection. Transport events arrive as [`GattEvent`] messages, one at a
//! time, and each handler runs to completion without blocking: reads return
//! their [`Response`] synchronously, writes and connection changes only
//! update session state.
//!
//! ```text
//!   Disconnected ──(Connected)──▶ Connected{subscribed, suspended}
//!        ▲                              │
//!        └──────(Disconnected)──────────┘   (session state dropped)
//! ```
//!
//! The transport below is abstracted by [`GattTransport`]; the firmware
//! implements it on the SoftDevice, tests implement it in memory.

use uuid::Uuid;

use super::profile::{Characteristic, CharacteristicKind, DescriptorKind, Service};
use crate::ble::PeerId;
use crate::error::Error;
use crate::hid::KeyboardReport;

/// CCCD value that enables notifications.
pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];
/// CCCD value that disables notifications and indications.
pub const DISABLE_NOTIFICATION_VALUE: [u8; 2] = [0x00, 0x00];

/// HID Control Point command: host entered suspend.
pub const CONTROL_POINT_SUSPEND: u8 = 0x00;
/// HID Control Point command: host left suspend.
pub const CONTROL_POINT_EXIT_SUSPEND: u8 = 0x01;

/// Link state reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Status carried by a read response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GattStatus {
    Success,
    /// Generic failure: unknown or unreadable attribute.
    Failure,
    /// Read offset past the end of the value.
    InvalidOffset,
}

/// Answer to a read request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub status: GattStatus,
    pub offset: u16,
    pub value: &'static [u8],
}

impl Response {
    pub const fn success(offset: u16, value: &'static [u8]) -> Self {
        Self {
            status: GattStatus::Success,
            offset,
            value,
        }
    }

    pub const fn failure() -> Self {
        Self {
            status: GattStatus::Failure,
            offset: 0,
            value: &[],
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GattStatus::Success
    }
}

/// A request or link event delivered by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GattEvent<'a> {
    ConnectionStateChanged {
        device: PeerId,
        state: ConnectionState,
    },
    CharacteristicRead {
        device: PeerId,
        uuid: Uuid,
        offset: u16,
    },
    CharacteristicWrite {
        device: PeerId,
        uuid: Uuid,
        value: &'a [u8],
    },
    DescriptorRead {
        device: PeerId,
        uuid: Uuid,
        offset: u16,
    },
    DescriptorWrite {
        device: PeerId,
        uuid: Uuid,
        value: &'a [u8],
    },
}

/// The GATT layer below the server.
pub trait GattTransport {
    /// Register `service` and start accepting requests.
    ///
    /// Fails with [`Error::TransportUnavailable`] when the radio or the
    /// attribute table cannot be used.
    fn open(&mut self, service: &Service) -> Result<(), Error>;

    /// Unregister the service and drop any link.
    fn close(&mut self);

    /// Send a notification for `characteristic` to `device`.
    fn notify(
        &mut self,
        device: &PeerId,
        characteristic: &Characteristic,
        value: &[u8],
    ) -> Result<(), Error>;
}

/// Per-connection state of the tracked central.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pub device: PeerId,
    /// Report notifications enabled by the central.
    pub subscribed: bool,
    /// Host signalled suspend through the HID Control Point.
    pub suspended: bool,
}

impl Session {
    const fn new(device: PeerId) -> Self {
        Self {
            device,
            subscribed: false,
            suspended: false,
        }
    }
}

/// HID GATT server.
pub struct GattServer<T: GattTransport> {
    transport: T,
    service: Option<Service>,
    session: Option<Session>,
}

impl<T: GattTransport> GattServer<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            service: None,
            session: None,
        }
    }

    /// Register `service` with the transport.
    ///
    /// On failure the server stays stopped.
    pub fn start(&mut self, service: Service) -> Result<(), Error> {
        if self.service.is_some() {
            warn!("GATT server already started");
            return Ok(());
        }

        if let Err(e) = self.transport.open(&service) {
            error!("Unable to open GATT server: {:?}", e);
            return Err(e);
        }

        info!(
            "GATT server started ({} characteristics)",
            service.characteristics.len()
        );
        self.service = Some(service);
        Ok(())
    }

    /// Release the service and forget the tracked connection.
    ///
    /// Safe to call any number of times, including before `start`.
    pub fn stop(&mut self) {
        self.session = None;
        if self.service.take().is_some() {
            self.transport.close();
            info!("GATT server stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.service.is_some()
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    /// The tracked connection, if a central is connected.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Route one transport event to its handler.
    ///
    /// Returns the response for read requests, `None` otherwise.
    pub fn dispatch(&mut self, event: GattEvent<'_>) -> Option<Response> {
        match event {
            GattEvent::ConnectionStateChanged { device, state } => {
                self.on_connection_state_change(device, state);
                None
            }
            GattEvent::CharacteristicRead {
                device,
                uuid,
                offset,
            } => Some(self.on_characteristic_read_at(device, &uuid, offset)),
            GattEvent::CharacteristicWrite {
                device,
                uuid,
                value,
            } => {
                self.on_characteristic_write(device, &uuid, value);
                None
            }
            GattEvent::DescriptorRead {
                device,
                uuid,
                offset,
            } => Some(self.on_descriptor_read_at(device, &uuid, offset)),
            GattEvent::DescriptorWrite {
                device,
                uuid,
                value,
            } => {
                self.on_descriptor_write(device, &uuid, value);
                None
            }
        }
    }

    /// Track or drop the central. Ignored while the server is stopped.
    pub fn on_connection_state_change(&mut self, device: PeerId, state: ConnectionState) {
        if self.service.is_none() {
            warn!("Link event {:?} from {:?} while stopped", state, device);
            return;
        }

        match state {
            ConnectionState::Connected => {
                info!("Central connected: {:?}", device);
                if let Some(previous) = self.session.replace(Session::new(device)) {
                    if previous.device != device {
                        debug!("Replacing tracked central {:?}", previous.device);
                    }
                }
            }
            ConnectionState::Disconnected => {
                info!("Central disconnected: {:?}", device);
                match self.session {
                    Some(session) if session.device == device => self.session = None,
                    Some(_) => warn!("Disconnect from untracked central {:?}", device),
                    None => {}
                }
            }
            ConnectionState::Connecting | ConnectionState::Disconnecting => {
                debug!("Ignoring intermediate link state {:?}", state);
            }
        }
    }

    pub fn on_characteristic_read(&mut self, device: PeerId, uuid: &Uuid) -> Response {
        self.on_characteristic_read_at(device, uuid, 0)
    }

    /// Read (or Read Blob, for `offset > 0`) of a characteristic value.
    pub fn on_characteristic_read_at(
        &mut self,
        device: PeerId,
        uuid: &Uuid,
        offset: u16,
    ) -> Response {
        let value = match CharacteristicKind::from_uuid(uuid) {
            Some(kind @ (CharacteristicKind::ReportMap | CharacteristicKind::HidInformation)) => {
                debug!("Read {:?} from {:?} at {}", kind, device, offset);
                self.static_value(kind)
            }
            Some(CharacteristicKind::Report | CharacteristicKind::HidControlPoint) | None => None,
        };

        match value {
            Some(value) => slice_response(GattStatus::Success, value, offset),
            None => {
                warn!("Invalid characteristic read: {:#x}", uuid.as_u128());
                Response::failure()
            }
        }
    }

    pub fn on_descriptor_read(&mut self, device: PeerId, uuid: &Uuid) -> Response {
        self.on_descriptor_read_at(device, uuid, 0)
    }

    /// Descriptor read.
    ///
    /// The Report Reference value goes out with a failure status; centrals
    /// that need the reference read it from the attached payload.
    pub fn on_descriptor_read_at(&mut self, device: PeerId, uuid: &Uuid, offset: u16) -> Response {
        let value = match DescriptorKind::from_uuid(uuid) {
            Some(DescriptorKind::ReportReference) => {
                debug!("Report reference descriptor read from {:?}", device);
                self.service
                    .as_ref()
                    .and_then(|s| s.characteristic(CharacteristicKind::Report))
                    .and_then(|c| c.descriptor(DescriptorKind::ReportReference))
                    .and_then(|d| d.value)
            }
            Some(DescriptorKind::HidControlPoint) | None => None,
        };

        match value {
            Some(value) => slice_response(GattStatus::Failure, value, offset),
            None => {
                warn!("Unknown descriptor read request: {:#x}", uuid.as_u128());
                Response::failure()
            }
        }
    }

    /// Descriptor write. Only the subscription toggle is meaningful;
    /// everything else is logged and dropped. No response is produced.
    pub fn on_descriptor_write(&mut self, device: PeerId, uuid: &Uuid, value: &[u8]) {
        if self.service.is_none() {
            warn!("Descriptor write from {:?} while stopped", device);
            return;
        }
        if DescriptorKind::from_uuid(uuid) != Some(DescriptorKind::HidControlPoint) {
            warn!("Unknown descriptor write request: {:#x}", uuid.as_u128());
            return;
        }

        let subscribed = if value == ENABLE_NOTIFICATION_VALUE {
            true
        } else if value == DISABLE_NOTIFICATION_VALUE {
            false
        } else {
            warn!("Ignoring subscription write {:?} from {:?}", value, device);
            return;
        };

        match self.session.as_mut() {
            Some(session) if session.device == device => {
                session.subscribed = subscribed;
                if subscribed {
                    debug!("Subscribe device to notifications: {:?}", device);
                } else {
                    debug!("Unsubscribe device from notifications: {:?}", device);
                }
            }
            _ => warn!("Subscription write from untracked central {:?}", device),
        }
    }

    /// Characteristic write. Handles HID Control Point suspend / exit
    /// suspend; anything else is logged and dropped.
    pub fn on_characteristic_write(&mut self, device: PeerId, uuid: &Uuid, value: &[u8]) {
        if self.service.is_none() {
            warn!("Characteristic write from {:?} while stopped", device);
            return;
        }
        if CharacteristicKind::from_uuid(uuid) != Some(CharacteristicKind::HidControlPoint) {
            warn!("Unexpected characteristic write: {:#x}", uuid.as_u128());
            return;
        }

        let suspended = match value {
            [CONTROL_POINT_SUSPEND] => true,
            [CONTROL_POINT_EXIT_SUSPEND] => false,
            _ => {
                warn!("Ignoring HID control point value {:?}", value);
                return;
            }
        };

        match self.session.as_mut() {
            Some(session) if session.device == device => {
                session.suspended = suspended;
                info!("Host suspend={} ({:?})", suspended, device);
            }
            _ => warn!("Control point write from untracked central {:?}", device),
        }
    }

    /// Encode `key_code` into an input report and send it.
    pub fn send_key_code(&mut self, key_code: u8) -> Result<(), Error> {
        self.send_report(&KeyboardReport::from_key_code(key_code))
    }

    /// Notify the tracked central with `report` on the Report
    /// characteristic. One shot: nothing is queued or retried.
    pub fn send_report(&mut self, report: &KeyboardReport) -> Result<(), Error> {
        let characteristic = self
            .service
            .as_ref()
            .and_then(|s| s.characteristic(CharacteristicKind::Report))
            .copied()
            .ok_or(Error::NotStarted)?;
        let session = self.session.ok_or(Error::NoTarget)?;

        if !session.subscribed {
            debug!("Central {:?} has not enabled notifications", session.device);
        }

        let bytes = report.to_bytes();
        self.transport
            .notify(&session.device, &characteristic, &bytes)?;
        trace!("Sent report {:?} to {:?}", bytes, session.device);
        Ok(())
    }

    fn static_value(&self, kind: CharacteristicKind) -> Option<&'static [u8]> {
        self.service
            .as_ref()
            .and_then(|s| s.characteristic(kind))
            .and_then(|c| c.value)
    }
}

fn slice_response(status: GattStatus, value: &'static [u8], offset: u16) -> Response {
    match value.get(offset as usize..) {
        Some(rest) => Response {
            status,
            offset,
            value: rest,
        },
        None => Response {
            status: GattStatus::InvalidOffset,
            offset,
            value: &[],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::profile::build_hid_service;
    use crate::gatt::{
        sig_uuid, HID_CONTROL_POINT, HID_INFORMATION, REPORT, REPORT_MAP,
        REPORT_REFERENCE_DESCRIPTOR,
    };
    use crate::hid::report_map;

    const D: PeerId = PeerId([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    const E: PeerId = PeerId([0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);

    #[derive(Default)]
    struct MemTransport {
        opened: usize,
        closed: usize,
        unavailable: bool,
        busy: bool,
        sent: std::vec::Vec<(PeerId, Uuid, std::vec::Vec<u8>)>,
    }

    impl GattTransport for MemTransport {
        fn open(&mut self, _service: &Service) -> Result<(), Error> {
            if self.unavailable {
                return Err(Error::TransportUnavailable);
            }
            self.opened += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.closed += 1;
        }

        fn notify(
            &mut self,
            device: &PeerId,
            characteristic: &Characteristic,
            value: &[u8],
        ) -> Result<(), Error> {
            if self.busy {
                return Err(Error::TransportBusy);
            }
            self.sent.push((*device, characteristic.uuid, value.to_vec()));
            Ok(())
        }
    }

    fn started() -> GattServer<MemTransport> {
        let mut server = GattServer::new(MemTransport::default());
        server.start(build_hid_service()).unwrap();
        server
    }

    fn connected(device: PeerId) -> GattServer<MemTransport> {
        let mut server = started();
        server.on_connection_state_change(device, ConnectionState::Connected);
        server
    }

    // ════════════════════════════════════════════════════════════════════════
    // Start / Stop
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn start_registers_once() {
        let mut server = started();
        assert!(server.is_started());
        assert_eq!(server.transport().opened, 1);

        server.start(build_hid_service()).unwrap();
        assert_eq!(server.transport().opened, 1);
    }

    #[test]
    fn start_fails_when_transport_unavailable() {
        let mut server = GattServer::new(MemTransport {
            unavailable: true,
            ..Default::default()
        });
        assert_eq!(
            server.start(build_hid_service()),
            Err(Error::TransportUnavailable)
        );
        assert!(!server.is_started());
        assert_eq!(server.send_key_code(4), Err(Error::NotStarted));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut server = GattServer::new(MemTransport::default());
        server.stop();
        server.stop();
        assert_eq!(server.transport().closed, 0);

        server.start(build_hid_service()).unwrap();
        server.on_connection_state_change(D, ConnectionState::Connected);
        server.stop();
        server.stop();
        assert_eq!(server.transport().closed, 1);
        assert!(!server.is_started());
        assert!(server.session().is_none());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Connection State
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn connect_tracks_device() {
        let server = connected(D);
        assert_eq!(server.connection_state(), ConnectionState::Connected);
        assert_eq!(server.session().map(|s| s.device), Some(D));
        assert!(!server.session().unwrap().subscribed);
    }

    #[test]
    fn new_connection_replaces_tracked_device() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        server.on_connection_state_change(E, ConnectionState::Connected);

        let session = server.session().unwrap();
        assert_eq!(session.device, E);
        assert!(!session.subscribed);
    }

    #[test]
    fn disconnect_resets_subscription() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        assert!(server.session().unwrap().subscribed);

        server.on_connection_state_change(D, ConnectionState::Disconnected);
        assert_eq!(server.connection_state(), ConnectionState::Disconnected);
        assert!(server.is_started());

        // Reconnect starts unsubscribed.
        server.on_connection_state_change(D, ConnectionState::Connected);
        assert!(!server.session().unwrap().subscribed);
    }

    #[test]
    fn disconnect_without_connection_is_harmless() {
        let mut server = started();
        server.on_connection_state_change(D, ConnectionState::Disconnected);
        assert_eq!(server.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn intermediate_states_are_ignored() {
        let mut server = started();
        server.on_connection_state_change(D, ConnectionState::Connecting);
        assert!(server.session().is_none());

        server.on_connection_state_change(D, ConnectionState::Connected);
        server.on_connection_state_change(D, ConnectionState::Disconnecting);
        assert_eq!(server.session().map(|s| s.device), Some(D));
    }

    #[test]
    fn connect_before_start_is_not_tracked() {
        let mut server = GattServer::new(MemTransport::default());
        server.on_connection_state_change(D, ConnectionState::Connected);
        assert!(server.session().is_none());

        server.start(build_hid_service()).unwrap();
        assert_eq!(server.connection_state(), ConnectionState::Disconnected);
        assert_eq!(server.send_key_code(4), Err(Error::NoTarget));
        assert!(server.transport().sent.is_empty());
    }

    #[test]
    fn connect_after_stop_is_not_tracked() {
        let mut server = started();
        server.stop();
        server.on_connection_state_change(D, ConnectionState::Connected);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[CONTROL_POINT_SUSPEND]);
        assert!(server.session().is_none());
    }

    #[test]
    fn disconnect_from_other_device_keeps_session() {
        let mut server = connected(D);
        server.on_connection_state_change(E, ConnectionState::Disconnected);
        assert_eq!(server.session().map(|s| s.device), Some(D));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Characteristic Reads
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn read_report_map() {
        let mut server = connected(D);
        let rsp = server.on_characteristic_read(D, &REPORT_MAP);
        assert_eq!(rsp.status, GattStatus::Success);
        assert_eq!(rsp.value, &report_map::REPORT_MAP[..]);
        assert_eq!(&rsp.value[..6], &[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]);
    }

    #[test]
    fn read_hid_information() {
        let mut server = connected(D);
        let rsp = server.on_characteristic_read(D, &HID_INFORMATION);
        assert!(rsp.is_success());
        assert_eq!(rsp.value, &[0x12, 0x00, 0x00]);
    }

    #[test]
    fn read_unsupported_characteristics_fails_empty() {
        let mut server = connected(D);
        for uuid in [REPORT, HID_CONTROL_POINT, sig_uuid(0x2A19), sig_uuid(0x1812)] {
            let rsp = server.on_characteristic_read(D, &uuid);
            assert_eq!(rsp.status, GattStatus::Failure);
            assert!(rsp.value.is_empty());
        }
        // The connection survives failed requests.
        assert_eq!(server.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn read_blob_of_report_map() {
        let mut server = connected(D);
        let rsp = server.on_characteristic_read_at(D, &REPORT_MAP, 22);
        assert!(rsp.is_success());
        assert_eq!(rsp.offset, 22);
        assert_eq!(rsp.value, &report_map::REPORT_MAP[22..]);

        let end = server.on_characteristic_read_at(D, &REPORT_MAP, 65);
        assert!(end.is_success());
        assert!(end.value.is_empty());

        let past = server.on_characteristic_read_at(D, &REPORT_MAP, 66);
        assert_eq!(past.status, GattStatus::InvalidOffset);
        assert!(past.value.is_empty());
    }

    #[test]
    fn read_before_start_fails() {
        let mut server = GattServer::new(MemTransport::default());
        let rsp = server.on_characteristic_read(D, &REPORT_MAP);
        assert_eq!(rsp, Response::failure());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Descriptors
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn report_reference_read_fails_with_payload() {
        let mut server = connected(D);
        let rsp = server.on_descriptor_read(D, &REPORT_REFERENCE_DESCRIPTOR);
        assert_eq!(rsp.status, GattStatus::Failure);
        assert_eq!(rsp.value, &[0x00, 0x01]);
    }

    #[test]
    fn report_reference_is_not_writable() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &REPORT_REFERENCE_DESCRIPTOR, &[0x05, 0x03]);
        let rsp = server.on_descriptor_read(D, &REPORT_REFERENCE_DESCRIPTOR);
        assert_eq!(rsp.value, &[0x00, 0x01]);
        assert_eq!(
            server
                .service()
                .and_then(|s| s.characteristic(CharacteristicKind::Report))
                .and_then(|c| c.descriptor(DescriptorKind::ReportReference))
                .and_then(|d| d.value),
            Some(&[0x00u8, 0x01][..])
        );
    }

    #[test]
    fn unknown_descriptor_read_fails_empty() {
        let mut server = connected(D);
        for uuid in [sig_uuid(0x2902), HID_CONTROL_POINT, REPORT] {
            let rsp = server.on_descriptor_read(D, &uuid);
            assert_eq!(rsp, Response::failure());
        }
    }

    #[test]
    fn subscription_toggle() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        assert!(server.session().unwrap().subscribed);

        server.on_descriptor_write(D, &HID_CONTROL_POINT, &DISABLE_NOTIFICATION_VALUE);
        assert!(!server.session().unwrap().subscribed);
    }

    #[test]
    fn malformed_subscription_write_is_ignored() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);

        let malformed: [&[u8]; 5] = [&[], &[0x02, 0x00], &[0x01], &[0x01, 0x00, 0x00], &[0xFF, 0xFF]];
        for value in malformed {
            server.on_descriptor_write(D, &HID_CONTROL_POINT, value);
            assert!(server.session().unwrap().subscribed);
        }
    }

    #[test]
    fn writes_to_other_descriptors_are_ignored() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &sig_uuid(0x2902), &ENABLE_NOTIFICATION_VALUE);
        server.on_descriptor_write(D, &REPORT_REFERENCE_DESCRIPTOR, &ENABLE_NOTIFICATION_VALUE);
        assert!(!server.session().unwrap().subscribed);
    }

    #[test]
    fn subscription_from_untracked_device_is_ignored() {
        let mut server = connected(D);
        server.on_descriptor_write(E, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        assert!(!server.session().unwrap().subscribed);
    }

    // ════════════════════════════════════════════════════════════════════════
    // HID Control Point
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn control_point_suspend_and_resume() {
        let mut server = connected(D);
        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[CONTROL_POINT_SUSPEND]);
        assert!(server.session().unwrap().suspended);

        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[CONTROL_POINT_EXIT_SUSPEND]);
        assert!(!server.session().unwrap().suspended);

        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[CONTROL_POINT_SUSPEND]);
        server.on_connection_state_change(D, ConnectionState::Disconnected);
        server.on_connection_state_change(D, ConnectionState::Connected);
        assert!(!server.session().unwrap().suspended);
    }

    #[test]
    fn control_point_ignores_unknown_commands() {
        let mut server = connected(D);
        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[0x02]);
        server.on_characteristic_write(D, &HID_CONTROL_POINT, &[]);
        server.on_characteristic_write(D, &REPORT_MAP, &[CONTROL_POINT_SUSPEND]);
        assert!(!server.session().unwrap().suspended);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Report Sending
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn send_key_code_to_subscribed_device() {
        let mut server = connected(D);
        server.on_descriptor_write(D, &HID_CONTROL_POINT, &ENABLE_NOTIFICATION_VALUE);
        server.send_key_code(4).unwrap();

        let sent = &server.transport().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, D);
        assert_eq!(sent[0].1, REPORT);
        assert_eq!(sent[0].2, [0, 0, 4, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn send_key_code_without_connection_is_no_target() {
        let mut server = started();
        assert_eq!(server.send_key_code(4), Err(Error::NoTarget));
        assert!(server.transport().sent.is_empty());

        server.on_connection_state_change(D, ConnectionState::Connected);
        server.on_connection_state_change(D, ConnectionState::Disconnected);
        assert_eq!(server.send_key_code(4), Err(Error::NoTarget));
        assert!(server.transport().sent.is_empty());
    }

    #[test]
    fn reports_follow_the_replacing_central() {
        let mut server = connected(D);
        server.send_key_code(4).unwrap();
        server.on_connection_state_change(E, ConnectionState::Connected);
        server.send_key_code(5).unwrap();

        // A late disconnect from the replaced central changes nothing.
        server.on_connection_state_change(D, ConnectionState::Disconnected);
        server.send_key_code(6).unwrap();

        let sent: std::vec::Vec<(PeerId, u8)> =
            server.transport().sent.iter().map(|s| (s.0, s.2[2])).collect();
        assert_eq!(sent, [(D, 4), (E, 5), (E, 6)]);
    }

    #[test]
    fn busy_transport_is_surfaced_not_queued() {
        let mut server = connected(D);
        server.transport_mut().busy = true;
        assert_eq!(server.send_key_code(4), Err(Error::TransportBusy));

        server.transport_mut().busy = false;
        server.send_key_code(5).unwrap();
        let sent = &server.transport().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2[2], 5);
    }

    #[test]
    fn repeated_key_codes_are_discrete_reports() {
        let mut server = connected(D);
        server.send_key_code(4).unwrap();
        server.send_key_code(4).unwrap();
        server.send_key_code(0).unwrap();
        let keys: std::vec::Vec<u8> = server.transport().sent.iter().map(|s| s.2[2]).collect();
        assert_eq!(keys, [4, 4, 0]);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn dispatch_routes_events() {
        let mut server = started();
        assert_eq!(
            server.dispatch(GattEvent::ConnectionStateChanged {
                device: D,
                state: ConnectionState::Connected,
            }),
            None
        );
        let rsp = server.dispatch(GattEvent::CharacteristicRead {
            device: D,
            uuid: HID_INFORMATION,
            offset: 1,
        });
        assert_eq!(rsp, Some(Response::success(1, &[0x00, 0x00])));

        assert_eq!(
            server.dispatch(GattEvent::DescriptorWrite {
                device: D,
                uuid: HID_CONTROL_POINT,
                value: &ENABLE_NOTIFICATION_VALUE,
            }),
            None
        );
        assert!(server.session().unwrap().subscribed);

        let rsp = server
            .dispatch(GattEvent::DescriptorRead {
                device: D,
                uuid: REPORT_REFERENCE_DESCRIPTOR,
                offset: 0,
            })
            .unwrap();
        assert_eq!(rsp.status, GattStatus::Failure);
        assert_eq!(rsp.value, &[0x00, 0x01]);

        assert_eq!(
            server.dispatch(GattEvent::CharacteristicWrite {
                device: D,
                uuid: HID_CONTROL_POINT,
                value: &[CONTROL_POINT_SUSPEND],
            }),
            None
        );
        assert!(server.session().unwrap().suspended);
    }
}
