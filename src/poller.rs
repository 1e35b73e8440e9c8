//! The polling loop.
//!
//! One cycle is one GET, dispatched on status and content type:
//!
//! | Response | Action | Outcome |
//! |----------|--------|---------|
//! | PNG (raw or base64 JSON) | image pipeline | `Displayed` or `Errored` |
//! | JSON `message` | split, wrap, draw | `Displayed` |
//! | JSON with neither | nothing | `Skipped` |
//! | non-200 | `report_error("<code>")` | `Errored` |
//! | transport or parse failure | `report_error("<error>")` | `Errored` |
//!
//! A failed cycle never stops the loop. The one exception is a panel
//! failure, which no retry can fix, so [`Poller::run`] returns it.
//!
//! Between cycles the loop sleeps for the polling interval. With deep sleep
//! configured it instead pauses one second, shuts the radio down and deep
//! sleeps once; the device restarts from boot afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use pollpanel::{Poller, ReqwestClient, Settings, TokioSleep};
//!
//! let settings = Settings::load("settings.yaml")?;
//! let mut poller = Poller::new(display, ReqwestClient::new(), radio, TokioSleep, &settings)?
//!     .with_indicator(led);
//! let shutdown = poller.run().await?;
//! ```

use std::time::Duration;

use crate::boot::{Indicator, NoIndicator};
use crate::config::Settings;
use crate::display::{DisplayAdapter, TextOptions};
use crate::error::{Error, PanelError};
use crate::image::show_png;
use crate::protocol::{dispatch, Dispatch, RenderRequest};
use crate::time::Sleep;
use crate::transport::{HttpClient, PollRequest};
use crate::wifi::Radio;

/// Pause before shutting the radio down for deep sleep.
pub const DEEP_SLEEP_GRACE: Duration = Duration::from_secs(1);

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Content reached the panel
    Displayed,
    /// Nothing to draw
    Skipped(String),
    /// An error message reached the panel
    Errored(String),
}

/// Why [`Poller::run`] returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Deep sleep was entered for this long
    DeepSleep(Duration),
}

/// Owns every handle the loop needs.
pub struct Poller<D, H, R, S, I = NoIndicator> {
    display: D,
    http: H,
    radio: R,
    sleeper: S,
    indicator: I,
    request: PollRequest,
    polling_interval: Duration,
    deep_sleep: Option<Duration>,
}

impl<D, H, R, S> Poller<D, H, R, S>
where
    D: DisplayAdapter,
    H: HttpClient,
    R: Radio,
    S: Sleep,
{
    /// Create a poller from settings.
    ///
    /// Fails if the request headers in `settings` are not valid HTTP.
    pub fn new(display: D, http: H, radio: R, sleeper: S, settings: &Settings) -> Result<Self, Error> {
        Ok(Self {
            display,
            http,
            radio,
            sleeper,
            indicator: NoIndicator,
            request: PollRequest::from_settings(settings)?,
            polling_interval: settings.polling_interval(),
            deep_sleep: settings.deep_sleep(),
        })
    }
}

impl<D, H, R, S, I> Poller<D, H, R, S, I>
where
    D: DisplayAdapter,
    H: HttpClient,
    R: Radio,
    S: Sleep,
    I: Indicator,
{
    /// Light `indicator` while each request is in flight.
    pub fn with_indicator<J: Indicator>(self, indicator: J) -> Poller<D, H, R, S, J> {
        Poller {
            display: self.display,
            http: self.http,
            radio: self.radio,
            sleeper: self.sleeper,
            indicator,
            request: self.request,
            polling_interval: self.polling_interval,
            deep_sleep: self.deep_sleep,
        }
    }

    /// Override the pause between cycles.
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Deep sleep after the next cycle instead of pausing.
    #[must_use]
    pub fn with_deep_sleep(mut self, duration: Duration) -> Self {
        self.deep_sleep = Some(duration);
        self
    }

    /// The display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The radio.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// The sleeper.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// The indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Run cycles until deep sleep or a panel failure.
    pub async fn run(&mut self) -> Result<Shutdown, Error> {
        loop {
            if let Some(shutdown) = self.cycle().await? {
                return Ok(shutdown);
            }
        }
    }

    /// One cycle followed by the inter-cycle wait.
    ///
    /// Returns `Some` once deep sleep has been entered.
    pub async fn cycle(&mut self) -> Result<Option<Shutdown>, PanelError> {
        let outcome = self.poll_once().await?;
        tracing::debug!(?outcome, "cycle finished");

        match self.deep_sleep {
            Some(duration) => {
                tracing::info!(seconds = duration.as_secs(), "Deep sleep");
                self.sleeper.sleep(DEEP_SLEEP_GRACE).await;
                self.radio.disconnect();
                self.radio.deactivate();
                self.sleeper.deep_sleep(duration).await;
                Ok(Some(Shutdown::DeepSleep(duration)))
            }
            None => {
                self.sleeper.sleep(self.polling_interval).await;
                Ok(None)
            }
        }
    }

    /// Request once and render the response, without sleeping.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, PanelError> {
        self.indicator.on();
        let outcome = self.request_and_render().await;
        self.indicator.off();
        outcome
    }

    async fn request_and_render(&mut self) -> Result<CycleOutcome, PanelError> {
        let response = match self.http.get(&self.request).await {
            Ok(response) => response,
            Err(err) => return self.fail(err),
        };

        match dispatch(&response) {
            Ok(Dispatch::Render(RenderRequest::Image { raw_bytes })) => {
                let outcome = show_png(&mut self.display, &raw_bytes)?;
                if outcome == CycleOutcome::Displayed {
                    tracing::info!(bytes = raw_bytes.len(), "Image shown");
                }
                Ok(outcome)
            }
            Ok(Dispatch::Render(RenderRequest::Text { lines })) => {
                tracing::info!(?lines, "Message");
                self.display.render_text(&lines, TextOptions::default())?;
                Ok(CycleOutcome::Displayed)
            }
            Ok(Dispatch::Status(status)) => {
                tracing::warn!(%status, "Request failed");
                self.display.report_error(status.as_str());
                Ok(CycleOutcome::Errored(status.as_str().to_string()))
            }
            Ok(Dispatch::Empty) => {
                tracing::debug!("response had nothing to show");
                Ok(CycleOutcome::Skipped("nothing to show".to_string()))
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: Error) -> Result<CycleOutcome, PanelError> {
        if let Error::Panel(err) = err {
            return Err(err);
        }
        let message = err.to_string();
        tracing::error!(error = %message, "cycle failed");
        self.display.report_error(&message);
        Ok(CycleOutcome::Errored(message))
    }
}
