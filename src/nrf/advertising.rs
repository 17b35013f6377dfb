//! Connectable advertising on the SoftDevice and the link task.
//!
//! [`SdAdvertiser`] only posts requests; [`ble_task`] owns the radio. It
//! advertises while a request is latched, serves one central at a time,
//! and goes back to advertising when that central leaves.

use core::pin::pin;
use core::task::Poll;

use defmt::{info, warn};
use embassy_futures::poll_once;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use hogp_keyboard::ble::{
    AdvertiseSettings, AdvertisementData, AdvertisingBackend, AdvertisingEvent,
};
use hogp_keyboard::config::ADV_PAYLOAD_MAX;
use hogp_keyboard::gatt::ConnectionState;
use hogp_keyboard::{AdvertiseError, GattEvent};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection, TxPower};
use nrf_softdevice::Softdevice;

use super::gatt::{peer_id, HidServer};
use super::with_keyboard;

enum Request {
    Start {
        settings: AdvertiseSettings,
        data: Vec<u8, ADV_PAYLOAD_MAX>,
    },
    Stop,
}

impl Request {
    fn into_latch(self) -> Option<(AdvertiseSettings, Vec<u8, ADV_PAYLOAD_MAX>)> {
        match self {
            Request::Start { settings, data } => Some((settings, data)),
            Request::Stop => None,
        }
    }
}

static REQUEST: Signal<CriticalSectionRawMutex, Request> = Signal::new();

/// [`AdvertisingBackend`] that forwards requests to [`ble_task`].
pub struct SdAdvertiser;

impl AdvertisingBackend for SdAdvertiser {
    fn start(
        &mut self,
        settings: &AdvertiseSettings,
        data: &AdvertisementData,
    ) -> Result<(), AdvertiseError> {
        let data = Vec::from_slice(data.as_bytes()).map_err(|_| AdvertiseError::DataTooLarge)?;
        REQUEST.signal(Request::Start {
            settings: *settings,
            data,
        });
        Ok(())
    }

    fn stop(&mut self) {
        REQUEST.signal(Request::Stop);
    }
}

/// Closest supported S140 output power at or below `dbm`.
fn tx_power(dbm: i8) -> TxPower {
    match dbm {
        i8::MIN..=-30 => TxPower::Minus40dBm,
        -29..=-18 => TxPower::Minus20dBm,
        -17..=-14 => TxPower::Minus16dBm,
        -13..=-10 => TxPower::Minus12dBm,
        -9..=-6 => TxPower::Minus8dBm,
        -5..=-2 => TxPower::Minus4dBm,
        -1..=2 => TxPower::ZerodBm,
        3 => TxPower::Plus3dBm,
        _ => TxPower::Plus4dBm,
    }
}

fn config(settings: &AdvertiseSettings) -> peripheral::Config {
    peripheral::Config {
        interval: settings.mode.interval(),
        timeout: settings.timeout,
        tx_power: tx_power(settings.tx_power.dbm()),
        ..Default::default()
    }
}

fn map_error(e: peripheral::AdvertiseError) -> AdvertiseError {
    match e {
        peripheral::AdvertiseError::NoFreeConn => AdvertiseError::TooManyAdvertisers,
        peripheral::AdvertiseError::Timeout => AdvertiseError::Internal,
        peripheral::AdvertiseError::Raw(raw) => {
            warn!("Advertising rejected by SoftDevice: {:?}", raw);
            AdvertiseError::Internal
        }
    }
}

/// Advertise until a central connects or a stop request arrives.
///
/// Returns `None` when stopped or when advertising failed.
async fn advertise(
    sd: &'static Softdevice,
    settings: &AdvertiseSettings,
    data: &[u8],
) -> Option<Connection> {
    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: data,
        scan_data: &[],
    };
    let config = config(settings);
    let mut fut = pin!(peripheral::advertise_connectable(sd, adv, &config));

    // The SoftDevice starts advertising on the first poll.
    let outcome = match poll_once(&mut fut) {
        Poll::Ready(outcome) => outcome,
        Poll::Pending => {
            with_keyboard(|k| k.on_advertising_event(AdvertisingEvent::Started));
            match select(&mut fut, REQUEST.wait()).await {
                Either::First(outcome) => outcome,
                Either::Second(request) => {
                    // Re-latch so the outer loop sees it.
                    REQUEST.signal(request);
                    return None;
                }
            }
        }
    };

    match outcome {
        Ok(conn) => {
            with_keyboard(|k| k.on_advertising_event(AdvertisingEvent::Paused));
            Some(conn)
        }
        Err(e) => {
            let reason = map_error(e);
            with_keyboard(|k| k.on_advertising_event(AdvertisingEvent::StartFailed(reason)));
            None
        }
    }
}

/// Serve `conn` until it drops.
async fn serve(conn: Connection, server: &HidServer) {
    let device = peer_id(&conn);
    with_keyboard(|k| {
        k.server_mut().transport_mut().attach(conn.clone());
        k.on_gatt_event(GattEvent::ConnectionStateChanged {
            device,
            state: ConnectionState::Connected,
        });
    });

    let reason = gatt_server::run(&conn, server, |write| write.dispatch(device)).await;
    info!("Link closed: {:?}", reason);

    with_keyboard(|k| {
        k.server_mut().transport_mut().detach();
        k.on_gatt_event(GattEvent::ConnectionStateChanged {
            device,
            state: ConnectionState::Disconnected,
        });
    });
}

#[embassy_executor::task]
pub async fn ble_task(sd: &'static Softdevice, server: HidServer) -> ! {
    let mut latched: Option<(AdvertiseSettings, Vec<u8, ADV_PAYLOAD_MAX>)> = None;

    loop {
        let Some((settings, data)) = latched.as_ref() else {
            latched = REQUEST.wait().await.into_latch();
            continue;
        };

        if let Some(conn) = advertise(sd, settings, data).await {
            serve(conn, &server).await;
            // Advertise again unless a request changed the plan.
            if let Some(request) = REQUEST.try_take() {
                latched = request.into_latch();
            }
        } else {
            // Stopped, restarted or failed; a failed start waits for a new request.
            latched = REQUEST.try_take().and_then(Request::into_latch);
        }
    }
}
