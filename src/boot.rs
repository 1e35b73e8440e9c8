//! Boot sequence and the status LED.
//!
//! ```text
//! blink x1 -> "Booting..." -> Wi-Fi bring-up -> "Wifi ready.\n<ip>" -> blink x3
//! ```
//!
//! If bring-up fails the error text is left on the panel and the error is
//! returned. The platform should reset the device at that point.

use std::time::Duration;

use crate::display::{DisplayAdapter, TextOptions};
use crate::error::Error;
use crate::text::split_lines;
use crate::time::Sleep;
use crate::wifi::{prepare_wifi, Connection, Radio, WifiCredentials};

/// On and off time of one blink.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(200);

/// Blinks after a successful bring-up.
pub const READY_BLINKS: u32 = 3;

/// A status LED.
pub trait Indicator {
    /// Light the LED.
    fn on(&mut self);

    /// Turn the LED off.
    fn off(&mut self);
}

/// For boards without a status LED.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn on(&mut self) {}

    fn off(&mut self) {}
}

/// Blink `count` times, [`BLINK_INTERVAL`] on and off.
pub async fn blink<I, S>(indicator: &mut I, sleeper: &mut S, count: u32)
where
    I: Indicator + ?Sized,
    S: Sleep,
{
    for _ in 0..count {
        indicator.on();
        sleeper.sleep(BLINK_INTERVAL).await;
        indicator.off();
        sleeper.sleep(BLINK_INTERVAL).await;
    }
}

/// Show boot progress and bring the network up.
pub async fn boot<D, R, S, I>(
    display: &mut D,
    radio: &mut R,
    sleeper: &mut S,
    credentials: &WifiCredentials,
    indicator: &mut I,
) -> Result<Connection, Error>
where
    D: DisplayAdapter + ?Sized,
    R: Radio,
    S: Sleep,
    I: Indicator + ?Sized,
{
    blink(indicator, sleeper, 1).await;
    tracing::info!("Booting...");
    display.render_text(&split_lines("Booting..."), TextOptions::default())?;

    let connection = match prepare_wifi(radio, credentials, sleeper).await {
        Ok(connection) => connection,
        Err(err) => {
            tracing::error!(%err, "Wi-Fi bring-up failed");
            display.render_text(&split_lines(&err.to_string()), TextOptions::default())?;
            return Err(err.into());
        }
    };

    let ready = format!("Wifi ready.\n{}", connection.ip);
    display.render_text(&split_lines(&ready), TextOptions::default())?;
    blink(indicator, sleeper, READY_BLINKS).await;
    Ok(connection)
}
