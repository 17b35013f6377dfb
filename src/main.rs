//! hogp-keyboard firmware for the nRF52840 (S140 SoftDevice).
//!
//! Boot order: SoftDevice, HID service registration, BLE link task, then
//! `start_service` (advertising + GATT server) and the button tasks.

#![no_std]
#![no_main]

mod nrf;

use defmt::{error, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::Pin as _;
use embassy_nrf::interrupt::Priority;
use hogp_keyboard::build_hid_service;
use hogp_keyboard::config::BUTTON_KEY_CODES;
use {defmt_rtt as _, panic_probe as _};

use crate::nrf::gatt::{self, HidServer};
use crate::nrf::{advertising, buttons, with_keyboard};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hogp-keyboard starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = nrf::enable_softdevice();
    let registered = gatt::register(sd, &build_hid_service());
    let sd: &'static _ = sd;
    unwrap!(spawner.spawn(nrf::softdevice_task(sd)));

    match registered {
        Ok(handles) => {
            with_keyboard(|k| k.server_mut().transport_mut().set_handles(handles));
            unwrap!(spawner.spawn(advertising::ble_task(sd, HidServer::new(handles))));
        }
        Err(e) => error!("HID service not registered: {:?}", e),
    }

    match with_keyboard(|k| k.start_service()) {
        Ok(report) => match report.advertising {
            Ok(()) => info!("Waiting for a host"),
            Err(e) => warn!("Service up without advertising: {:?}", e),
        },
        Err(e) => error!("Unable to start HID service: {:?}", e),
    }

    let pins = [
        p.P0_11.degrade(),
        p.P0_12.degrade(),
        p.P0_24.degrade(),
        p.P0_25.degrade(),
    ];
    for (pin, key_code) in pins.into_iter().zip(BUTTON_KEY_CODES) {
        unwrap!(spawner.spawn(buttons::button_task(pin, key_code)));
    }
}
