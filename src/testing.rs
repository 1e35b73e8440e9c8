//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::boot::Indicator;
use crate::display::{DisplayAdapter, TextOptions};
use crate::error::{Error, PanelError, WifiError};
use crate::image::Bitmap;
use crate::time::Sleep;
use crate::transport::{HttpClient, HttpResponse, PollRequest};
use crate::wifi::{LinkStatus, Radio};

/// One call observed by [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    RenderText(Vec<String>),
    RenderImage {
        width: u32,
        height: u32,
        rows: Vec<Vec<bool>>,
    },
    ReportError(String),
}

/// Display adapter that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    width: u32,
    height: u32,
    pub calls: Vec<DisplayCall>,
}

impl RecordingDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }
}

impl DisplayAdapter for RecordingDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn render_text(&mut self, lines: &[String], _options: TextOptions) -> Result<(), PanelError> {
        self.calls.push(DisplayCall::RenderText(lines.to_vec()));
        Ok(())
    }

    fn render_image(&mut self, bitmap: Bitmap) -> Result<(), Error> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let rows = bitmap.into_rows().collect::<Result<Vec<_>, _>>()?;
        self.calls.push(DisplayCall::RenderImage {
            width,
            height,
            rows,
        });
        Ok(())
    }

    fn report_error(&mut self, message: &str) {
        self.calls.push(DisplayCall::ReportError(message.to_string()));
    }
}

/// Encode raw scanlines (already packed for `bit_depth`) as a PNG file.
pub fn encode_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    data: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        if color_type == png::ColorType::Indexed {
            encoder.set_palette(vec![0, 0, 0, 255, 255, 255]);
        }
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}

/// Encode rows of light (`true`) and dark pixels as a 1-bit greyscale PNG.
pub fn one_bit_png(rows: &[Vec<bool>]) -> Vec<u8> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, Vec::len) as u32;
    let mut data = Vec::new();
    for row in rows {
        for chunk in row.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &light)| if light { acc | (0x80 >> i) } else { acc });
            data.push(byte);
        }
    }
    encode_png(width, height, png::ColorType::Grayscale, png::BitDepth::One, &data)
}

/// Records requested durations and returns at once.
#[derive(Debug, Default)]
pub struct RecordingSleep {
    pub sleeps: Vec<Duration>,
    pub deep_sleeps: Vec<Duration>,
}

impl Sleep for RecordingSleep {
    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }

    async fn deep_sleep(&mut self, duration: Duration) {
        self.deep_sleeps.push(duration);
    }
}

/// Radio that reports a scripted sequence of link statuses.
#[derive(Debug)]
pub struct ScriptedRadio {
    script: VecDeque<LinkStatus>,
    fallback: LinkStatus,
    last: LinkStatus,
    fail_activate: bool,
    pub active: bool,
    pub country: Option<String>,
    pub connects: u32,
    pub disconnects: u32,
    pub deactivations: u32,
    pub status_reads: u32,
}

impl ScriptedRadio {
    pub const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

    /// Report `script` in order, then repeat its last entry.
    pub fn new(script: Vec<LinkStatus>) -> Self {
        let fallback = script.last().copied().unwrap_or(LinkStatus::Down);
        Self {
            script: script.into(),
            fallback,
            last: LinkStatus::Down,
            fail_activate: false,
            active: false,
            country: None,
            connects: 0,
            disconnects: 0,
            deactivations: 0,
            status_reads: 0,
        }
    }

    pub fn always(status: LinkStatus) -> Self {
        Self::new(vec![status])
    }

    pub fn failing_activate(mut self) -> Self {
        self.fail_activate = true;
        self
    }
}

impl Radio for ScriptedRadio {
    fn set_country(&mut self, country: &str) -> Result<(), WifiError> {
        self.country = Some(country.to_string());
        Ok(())
    }

    fn activate(&mut self) -> Result<(), WifiError> {
        if self.fail_activate {
            return Err(WifiError::Radio("chip not responding".to_string()));
        }
        self.active = true;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.deactivations += 1;
    }

    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), WifiError> {
        self.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn status(&mut self) -> LinkStatus {
        self.status_reads += 1;
        self.last = self.script.pop_front().unwrap_or(self.fallback);
        self.last
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        (self.last == LinkStatus::GotIp).then_some(Self::IP)
    }
}

/// HTTP client that replays scripted responses.
#[derive(Debug, Default)]
pub struct ScriptedHttp {
    responses: VecDeque<Result<HttpResponse, Error>>,
    pub requests: u32,
    pub last_request: Option<PollRequest>,
}

impl ScriptedHttp {
    pub fn new(responses: Vec<Result<HttpResponse, Error>>) -> Self {
        Self {
            responses: responses.into(),
            ..Self::default()
        }
    }
}

impl HttpClient for ScriptedHttp {
    async fn get(&mut self, request: &PollRequest) -> Result<HttpResponse, Error> {
        self.requests += 1;
        self.last_request = Some(request.clone());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("no scripted response".to_string())))
    }
}

/// Records LED states.
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub toggles: Vec<bool>,
}

impl Indicator for RecordingIndicator {
    fn on(&mut self) {
        self.toggles.push(true);
    }

    fn off(&mut self) {
        self.toggles.push(false);
    }
}
