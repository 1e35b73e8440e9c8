//! Run the client on a desktop, drawing the panel in the terminal.
//!
//! Run with:
//!   cargo run --example dev_server
//!   REQUEST_URL=http://localhost:8000/display POLLING_TIME_SECONDS=5 \
//!     cargo run --example host_client --features full
//!
//! Or pass a settings file: cargo run --example host_client --features full -- settings.yaml
//!
//! `RUST_LOG=pollpanel=debug` shows every state transition.

use std::net::Ipv4Addr;

use pollpanel::{
    boot, LinkStatus, MemoryPanel, NoIndicator, Panel, PanelError, Poller, Radio, ReqwestClient,
    Settings, TokioSleep, WifiError,
};
use tracing_subscriber::EnvFilter;

/// Panel that prints its buffer on every flush.
struct TerminalPanel {
    buffer: MemoryPanel,
}

impl Panel for TerminalPanel {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn fill(&mut self, value: bool) {
        self.buffer.fill(value)
    }

    fn set_pixel(&mut self, x: u32, y: u32, value: bool) {
        self.buffer.set_pixel(x, y, value)
    }

    fn flush(&mut self) -> Result<(), PanelError> {
        self.buffer.flush()?;
        println!("{}", self.buffer.to_ascii());
        Ok(())
    }
}

/// The host is already online, so the link comes up on the first read.
#[derive(Default)]
struct LoopbackRadio {
    connected: bool,
}

impl Radio for LoopbackRadio {
    fn set_country(&mut self, country: &str) -> Result<(), WifiError> {
        tracing::debug!(country, "set country");
        Ok(())
    }

    fn activate(&mut self) -> Result<(), WifiError> {
        Ok(())
    }

    fn deactivate(&mut self) {}

    fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), WifiError> {
        tracing::debug!(ssid, "connect");
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn status(&mut self) -> LinkStatus {
        if self.connected {
            LinkStatus::GotIp
        } else {
            LinkStatus::Down
        }
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.connected.then_some(Ipv4Addr::LOCALHOST)
    }
}

#[tokio::main]
async fn main() -> Result<(), pollpanel::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollpanel=info")),
        )
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::from_env()?,
    };
    tracing::info!(?settings, "settings loaded");

    let kind = settings.display_kind()?;
    let (width, height) = kind.native_size();
    let panel = TerminalPanel {
        buffer: MemoryPanel::new(width, height),
    };
    let mut display = kind.build(panel);
    let mut radio = LoopbackRadio::default();
    let mut sleeper = TokioSleep;

    let connection = boot(
        &mut display,
        &mut radio,
        &mut sleeper,
        &settings.wifi_credentials(),
        &mut NoIndicator,
    )
    .await?;
    tracing::info!(ip = %connection.ip, "online");

    let mut poller = Poller::new(display, ReqwestClient::new(), radio, sleeper, &settings)?;
    let shutdown = poller.run().await?;
    tracing::info!(?shutdown, "stopped");
    Ok(())
}
