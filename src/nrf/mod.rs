//! nRF52840 + S140 SoftDevice glue for the firmware binary.
//!
//! 1. **GATT** - registers the HID profile tree with the SoftDevice and
//!    implements [`GattTransport`](hogp_keyboard::GattTransport) on top of
//!    its notification API.
//! 2. **Advertising** - implements
//!    [`AdvertisingBackend`](hogp_keyboard::ble::AdvertisingBackend) and the
//!    task that advertises, accepts a central and serves it.
//! 3. **Buttons** - DK buttons mapped to key codes.
//!
//! The [`Keyboard`] lives in one blocking mutex shared by every task, so
//! SoftDevice callbacks and application calls never interleave.

pub mod advertising;
pub mod buttons;
pub mod gatt;

use core::cell::RefCell;

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use hogp_keyboard::config::{ATT_MTU, DEVICE_NAME};
use hogp_keyboard::HidPeripheral;
use nrf_softdevice::{raw, Softdevice};

use self::advertising::SdAdvertiser;
use self::gatt::SdGatt;

pub type Keyboard = HidPeripheral<SdAdvertiser, SdGatt>;

/// The single exclusion domain for connection and subscription state.
pub static KEYBOARD: Mutex<CriticalSectionRawMutex, RefCell<Keyboard>> =
    Mutex::new(RefCell::new(HidPeripheral::new(SdAdvertiser, SdGatt::new())));

/// Run `f` with exclusive access to the keyboard.
pub fn with_keyboard<R>(f: impl FnOnce(&mut Keyboard) -> R) -> R {
    KEYBOARD.lock(|k| f(&mut k.borrow_mut()))
}

/// Enable the SoftDevice as a single-link peripheral.
pub fn enable_softdevice() -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&config);
    info!("SoftDevice enabled");
    sd
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
