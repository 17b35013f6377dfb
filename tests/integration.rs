//! Integration tests for the hogp-keyboard host-testable logic.

use std::cell::RefCell;
use std::rc::Rc;

use hogp_keyboard::ble::{AdvertiseSettings, AdvertisementData, AdvertiserState, AdvertisingBackend, AdvertisingEvent};
use hogp_keyboard::gatt::{
    short_uuid, Characteristic, CharacteristicKind, ConnectionState, Service, HID_CONTROL_POINT,
    REPORT, REPORT_MAP,
};
use hogp_keyboard::{
    build_hid_service, AdvertiseError, Error, GattEvent, GattStatus, GattTransport, HidPeripheral,
    PeerId,
};

/// Everything the fake radio saw, shared with the test body.
#[derive(Default)]
struct Log {
    adv_payloads: Vec<Vec<u8>>,
    registered: Vec<u16>,
    notifications: Vec<(PeerId, u16, Vec<u8>)>,
}

#[derive(Clone, Default)]
struct FakeRadio(Rc<RefCell<Log>>);

impl AdvertisingBackend for FakeRadio {
    fn start(&mut self, _: &AdvertiseSettings, data: &AdvertisementData) -> Result<(), AdvertiseError> {
        self.0.borrow_mut().adv_payloads.push(data.as_bytes().to_vec());
        Ok(())
    }

    fn stop(&mut self) {}
}

impl GattTransport for FakeRadio {
    fn open(&mut self, service: &Service) -> Result<(), Error> {
        let mut log = self.0.borrow_mut();
        log.registered.extend(short_uuid(&service.uuid));
        for c in &service.characteristics {
            log.registered.extend(short_uuid(&c.uuid));
            for d in c.descriptors {
                log.registered.extend(short_uuid(&d.uuid));
            }
        }
        Ok(())
    }

    fn close(&mut self) {}

    fn notify(&mut self, device: &PeerId, c: &Characteristic, value: &[u8]) -> Result<(), Error> {
        let short = short_uuid(&c.uuid).unwrap_or_default();
        self.0
            .borrow_mut()
            .notifications
            .push((*device, short, value.to_vec()));
        Ok(())
    }
}

fn peripheral() -> (HidPeripheral<FakeRadio, FakeRadio>, Rc<RefCell<Log>>) {
    let radio = FakeRadio::default();
    let log = radio.0.clone();
    (HidPeripheral::new(radio.clone(), radio), log)
}

#[test]
fn profile_tree_is_registered_in_order() {
    let (mut p, log) = peripheral();
    p.start_service().unwrap();
    assert_eq!(
        log.borrow().registered,
        [0x1812, 0x2A4D, 0x2908, 0x2A4B, 0x2A4A, 0x2A4C]
    );
}

#[test]
fn advertising_payload_names_the_keyboard() {
    let (mut p, log) = peripheral();
    let report = p.start_service().unwrap();
    assert!(report.is_advertising());

    let log = log.borrow();
    let payload = &log.adv_payloads[0];
    assert!(hogp_keyboard::ble::contains_service_uuid(payload, 0x1812));
    assert_eq!(
        hogp_keyboard::ble::extract_device_name(payload),
        Some(hogp_keyboard::config::DEVICE_NAME)
    );

    p.on_advertising_event(AdvertisingEvent::Started);
    assert_eq!(p.advertiser().state(), AdvertiserState::Advertising);
}

#[test]
fn report_map_read_after_build() {
    let service = build_hid_service();
    let report_map = service
        .characteristic(CharacteristicKind::ReportMap)
        .and_then(|c| c.value)
        .unwrap();
    assert_eq!(&report_map[..6], &[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]);

    let (mut p, _) = peripheral();
    p.start_service().unwrap();
    let d = PeerId::new([1, 1, 1, 1, 1, 1]);
    let rsp = p.server_mut().on_characteristic_read(d, &REPORT_MAP);
    assert_eq!(rsp.status, GattStatus::Success);
    assert_eq!(rsp.value, report_map);
}

#[test]
fn connect_subscribe_send() {
    let (mut p, log) = peripheral();
    p.start_service().unwrap();

    let d = PeerId::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    p.on_gatt_event(GattEvent::ConnectionStateChanged {
        device: d,
        state: ConnectionState::Connected,
    });
    p.on_gatt_event(GattEvent::DescriptorWrite {
        device: d,
        uuid: HID_CONTROL_POINT,
        value: &[0x01, 0x00],
    });
    assert!(p.server().session().unwrap().subscribed);

    p.send_key_code(4).unwrap();

    let log = log.borrow();
    assert_eq!(log.notifications.len(), 1);
    let (to, characteristic, bytes) = &log.notifications[0];
    assert_eq!(*to, d);
    assert_eq!(Some(*characteristic), short_uuid(&REPORT));
    assert_eq!(bytes, &[0, 0, 4, 0, 0, 0, 0, 0]);
}

#[test]
fn send_before_connect_fails() {
    let (mut p, log) = peripheral();
    p.start_service().unwrap();
    assert_eq!(p.send_key_code(4), Err(Error::NoTarget));
    assert!(log.borrow().notifications.is_empty());
}

#[test]
fn disconnect_resets_subscription() {
    let (mut p, _) = peripheral();
    p.start_service().unwrap();

    let d = PeerId::new([9; 6]);
    for state in [ConnectionState::Connected, ConnectionState::Disconnected] {
        p.on_gatt_event(GattEvent::ConnectionStateChanged { device: d, state });
        if state == ConnectionState::Connected {
            p.on_gatt_event(GattEvent::DescriptorWrite {
                device: d,
                uuid: HID_CONTROL_POINT,
                value: &[0x01, 0x00],
            });
        }
    }
    assert!(p.server().session().is_none());
    assert_eq!(p.send_key_code(4), Err(Error::NoTarget));
}
