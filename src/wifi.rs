//! Wi-Fi bring-up state machine.
//!
//! Brings a radio from inactive to an IP-assigned link with bounded waits
//! and bounded retries:
//!
//! ```text
//! Inactive -> Connecting -> Connected(ip)
//!                        -> Failed(LinkFailed | Timeout) -> (retry) Connecting
//!                                                         -> Aborted
//! ```
//!
//! One attempt reads the link status up to 10 times, one second apart. An
//! IP stops the wait at once, and so does a negative (terminal) status such
//! as a bad password. Failed attempts are retried up to 5 times with a fixed
//! 2 second pause. `Aborted` is fatal: a wedged radio is best cleared by a
//! cold boot, so the caller should reset the device.
//!
//! # Example
//!
//! ```rust,ignore
//! use pollpanel::wifi::{prepare_wifi, WifiCredentials};
//!
//! let credentials = WifiCredentials::new("home", "hunter2", "JP");
//! let connection = prepare_wifi(&mut radio, &credentials, &mut sleeper).await?;
//! println!("ip: {}", connection.ip);
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::WifiError;
use crate::time::Sleep;

/// Link status reported by the radio.
///
/// Codes follow the CYW43 driver used on the Pico W.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Link down (0)
    Down,
    /// Joining the network (1)
    Joining,
    /// Joined, waiting for DHCP (2)
    NoIp,
    /// IP acquired (3)
    GotIp,
    /// Connection failed (-1)
    Fail,
    /// No matching network found (-2)
    NoNet,
    /// Authentication failure (-3)
    BadAuth,
    /// Any other driver code
    Other(i32),
}

impl LinkStatus {
    /// Map a raw driver status code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LinkStatus::Down,
            1 => LinkStatus::Joining,
            2 => LinkStatus::NoIp,
            3 => LinkStatus::GotIp,
            -1 => LinkStatus::Fail,
            -2 => LinkStatus::NoNet,
            -3 => LinkStatus::BadAuth,
            other => LinkStatus::Other(other),
        }
    }

    /// Raw driver status code.
    pub fn code(&self) -> i32 {
        match self {
            LinkStatus::Down => 0,
            LinkStatus::Joining => 1,
            LinkStatus::NoIp => 2,
            LinkStatus::GotIp => 3,
            LinkStatus::Fail => -1,
            LinkStatus::NoNet => -2,
            LinkStatus::BadAuth => -3,
            LinkStatus::Other(code) => *code,
        }
    }

    /// Whether waiting longer cannot change the outcome.
    pub fn is_settled(&self) -> bool {
        let code = self.code();
        code < 0 || code >= LinkStatus::GotIp.code()
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Narrow interface to the wireless radio.
pub trait Radio {
    /// Set the regulatory domain (e.g. `"JP"`).
    fn set_country(&mut self, country: &str) -> Result<(), WifiError>;

    /// Power up the radio in station mode.
    fn activate(&mut self) -> Result<(), WifiError>;

    /// Power down the radio.
    fn deactivate(&mut self);

    /// Start joining a network.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), WifiError>;

    /// Leave the current network.
    fn disconnect(&mut self);

    /// Current link status.
    fn status(&mut self) -> LinkStatus;

    /// Assigned address, once the link is up.
    fn ip_address(&self) -> Option<Ipv4Addr>;
}

/// Network credentials and regulatory domain.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    /// Network name
    pub ssid: String,
    /// Network password
    pub password: String,
    /// Regulatory domain code
    pub country: String,
}

impl WifiCredentials {
    /// Create credentials.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            country: country.into(),
        }
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("country", &self.country)
            .finish()
    }
}

/// Bounds on waiting and retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up (default: 5)
    pub max_attempts: u32,
    /// Pause after a failed attempt (default: 2s)
    pub retry_delay: Duration,
    /// Status reads per attempt (default: 10)
    pub status_poll_ticks: u32,
    /// Pause between status reads (default: 1s)
    pub status_poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            status_poll_ticks: 10,
            status_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Bring-up progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Radio not yet touched
    Inactive,
    /// Attempt in progress
    Connecting,
    /// Link up with an address
    Connected(Ipv4Addr),
    /// Last attempt failed
    Failed(WifiError),
    /// Retries exhausted
    Aborted,
}

/// A successfully established link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Assigned address
    pub ip: Ipv4Addr,
    /// Attempts it took, starting at 1
    pub attempts: u32,
}

/// Bring-up state machine over a borrowed radio.
pub struct BringUp<'a, R, S> {
    radio: &'a mut R,
    sleeper: &'a mut S,
    credentials: &'a WifiCredentials,
    policy: RetryPolicy,
    state: ConnectionState,
}

impl<'a, R: Radio, S: Sleep> BringUp<'a, R, S> {
    /// Create a state machine in the `Inactive` state.
    pub fn new(radio: &'a mut R, credentials: &'a WifiCredentials, sleeper: &'a mut S) -> Self {
        Self {
            radio,
            sleeper,
            credentials,
            policy: RetryPolicy::default(),
            state: ConnectionState::Inactive,
        }
    }

    /// Override the default bounds.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Run attempts until connected, a non-retryable error, or the bound.
    pub async fn run(&mut self) -> Result<Connection, WifiError> {
        for attempt in 1..=self.policy.max_attempts {
            match self.attempt().await {
                Ok(ip) => {
                    self.transition(ConnectionState::Connected(ip));
                    tracing::info!(%ip, attempt, "Wi-Fi ready");
                    return Ok(Connection { ip, attempts: attempt });
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(attempt, %err, "Wi-Fi attempt failed");
                    self.transition(ConnectionState::Failed(err));
                    self.sleeper.sleep(self.policy.retry_delay).await;
                }
                Err(err) => {
                    tracing::error!(attempt, %err, "Wi-Fi radio error");
                    self.transition(ConnectionState::Failed(err.clone()));
                    return Err(err);
                }
            }
        }

        self.transition(ConnectionState::Aborted);
        tracing::error!(attempts = self.policy.max_attempts, "Wi-Fi retry expired");
        Err(WifiError::Aborted {
            attempts: self.policy.max_attempts,
        })
    }

    async fn attempt(&mut self) -> Result<Ipv4Addr, WifiError> {
        self.transition(ConnectionState::Connecting);
        self.radio.set_country(&self.credentials.country)?;
        self.radio.activate()?;
        self.radio
            .connect(&self.credentials.ssid, &self.credentials.password)?;

        let mut settled = None;
        for tick in 0..self.policy.status_poll_ticks {
            let status = self.radio.status();
            if status.is_settled() {
                settled = Some(status);
                break;
            }
            tracing::debug!(tick, %status, "Waiting for Wi-Fi");
            self.sleeper.sleep(self.policy.status_poll_interval).await;
        }

        match settled {
            None => Err(WifiError::Timeout),
            Some(LinkStatus::GotIp) => self
                .radio
                .ip_address()
                .ok_or(WifiError::LinkFailed(LinkStatus::GotIp)),
            Some(status) => Err(WifiError::LinkFailed(status)),
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::debug!(from = ?self.state, to = ?next, "Wi-Fi state");
        self.state = next;
    }
}

/// Bring the radio up with the default policy.
pub async fn prepare_wifi<R: Radio, S: Sleep>(
    radio: &mut R,
    credentials: &WifiCredentials,
    sleeper: &mut S,
) -> Result<Connection, WifiError> {
    BringUp::new(radio, credentials, sleeper).run().await
}
