//! GPIO buttons that type a key.
//!
//! Four DK buttons (active-low with internal pull-up), one task each. A
//! press sends the button's key code, a release sends the empty report.

use defmt::{debug, info, warn};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};
use hogp_keyboard::config::BUTTON_DEBOUNCE_MS;
use hogp_keyboard::Error;

use super::with_keyboard;

fn send(key_code: u8) {
    match with_keyboard(|k| k.send_key_code(key_code)) {
        Ok(()) => {}
        Err(e @ (Error::NoTarget | Error::NotStarted)) => {
            debug!("Key {:#x} dropped, no host: {:?}", key_code, e)
        }
        Err(e) => warn!("Key {:#x} not sent: {:?}", key_code, e),
    }
}

#[embassy_executor::task(pool_size = 4)]
pub async fn button_task(pin: AnyPin, key_code: u8) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        // Wait for falling edge (button press, active-low).
        btn.wait_for_falling_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Button pressed: key {:#x}", key_code);
            send(key_code);

            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
            send(0);
        }
    }
}
