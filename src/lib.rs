//! # pollpanel
//!
//! A resilient display client for small monochrome panels. The device polls
//! a server over Wi-Fi and shows what comes back, a text message or a PNG
//! image, on an SSD1306 OLED or a 2.13" e-paper panel.
//!
//! The crate is the logic between the hardware drivers:
//! - **Display adapters** hide each panel's size, rotation and polarity
//!   behind one [`DisplayAdapter`] contract
//! - **Image pipeline** validates and centers 1-bit greyscale PNGs
//! - **Wi-Fi bring-up** connects with bounded waits and bounded retries
//! - **Polling loop** turns an unreliable server into a steady refresh cycle
//!
//! Hardware is reached through three small traits: [`Panel`] (pixel buffer),
//! [`Radio`] (Wi-Fi chip) and [`Indicator`] (status LED). Waits go through
//! [`Sleep`], the HTTP exchange through [`HttpClient`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pollpanel::{boot, Poller, ReqwestClient, Settings, TokioSleep};
//!
//! let settings = Settings::load("settings.yaml")?;
//! let kind = settings.display_kind()?;
//! let mut display = kind.build(panel);
//! let mut sleeper = TokioSleep;
//!
//! boot(&mut display, &mut radio, &mut sleeper, &settings.wifi_credentials(), &mut led).await?;
//!
//! let mut poller = Poller::new(display, ReqwestClient::new(), radio, sleeper, &settings)?;
//! poller.run().await?;
//! ```
//!
//! ## Server Responses
//!
//! | Status | Content-Type | Body | Shown |
//! |--------|--------------|------|-------|
//! | 200 | `image/png` | PNG file | image |
//! | 200 | other | `{"image": {"content_type": "image/png", "data": "<base64>"}}` | image |
//! | 200 | other | `{"message": "..."}` | text |
//! | other | - | - | `Error: <status>` |
//!
//! ## Supported Displays
//!
//! | `DISPLAY_DEVICE` | Panel | Logical size |
//! |------------------|-------|--------------|
//! | `SSD1306`, `oled` | 128x64 I2C OLED | 128x64 |
//! | `EPAPER213`, `epaper_2in13` | Waveshare 2.13" V3 | 250x122 |
//!
//! ## Feature Flags
//!
//! - `tokio` - [`TokioSleep`], a cooperative timer
//! - `reqwest` - [`ReqwestClient`], an HTTP transport
//! - `full` - All features

pub mod boot;
pub mod config;
pub mod display;
mod error;
pub mod image;
pub mod panel;
pub mod poller;
pub mod protocol;
pub mod text;
pub mod time;
pub mod transport;
pub mod wifi;

#[cfg(test)]
pub(crate) mod testing;

pub use boot::{blink, boot, Indicator, NoIndicator};
pub use config::Settings;
pub use display::{DisplayAdapter, DisplayKind, EPaper213, Ssd1306, TextOptions};
pub use error::{Error, ImageError, PanelError, WifiError};
pub use image::{decode_png, show_base64_png, show_png, Bitmap};
pub use panel::{MemoryPanel, Panel};
pub use poller::{CycleOutcome, Poller, Shutdown};
pub use protocol::{RenderRequest, ServerPayload};
pub use time::{Sleep, ThreadSleep};
pub use transport::{HttpClient, HttpResponse, PollRequest};
pub use wifi::{prepare_wifi, Connection, LinkStatus, Radio, WifiCredentials};

#[cfg(feature = "tokio")]
pub use time::TokioSleep;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestClient;

/// Character cell width in pixels
pub const CHAR_WIDTH: u32 = 8;

/// Character cell height in pixels
pub const CHAR_HEIGHT: u32 = 8;

/// Blank pixels between text rows
pub const DEFAULT_LINE_MARGIN: u32 = 4;

/// Pause between polls when `POLLING_TIME_SECONDS` is not set
pub const DEFAULT_POLLING_TIME_SECONDS: u64 = 60;

/// `User-Agent` sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("pollpanel/", env!("CARGO_PKG_VERSION"));

/// Worldwide regulatory domain
pub const DEFAULT_COUNTRY: &str = "XX";
