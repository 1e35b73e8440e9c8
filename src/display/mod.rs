//! Display adapters.
//!
//! A [`DisplayAdapter`] hides one [`Panel`] behind a uniform contract: callers
//! see logical (post-rotation) dimensions and never deal with the panel's
//! colour polarity. Each hardware family is one implementation that owns its
//! panel and carries its own [`Geometry`] constants:
//!
//! | Variant | Native buffer | Logical size | Rotation | Background |
//! |---------|---------------|--------------|----------|------------|
//! | [`Ssd1306`] (OLED) | 128x64 | 128x64 | none | dark (`false`) |
//! | [`EPaper213`] (e-paper) | 128x250 | 250x122 | 90° | light (`true`) |
//!
//! Every render is a full repaint: clear to background, draw, flush. There
//! is no partial update, so rendering the same content twice yields the
//! same buffer.
//!
//! # Example
//!
//! ```
//! use pollpanel::display::{DisplayAdapter, DisplayKind, TextOptions};
//! use pollpanel::MemoryPanel;
//!
//! let kind = DisplayKind::from_name("SSD1306").unwrap();
//! let (w, h) = kind.native_size();
//! let mut display = kind.build(MemoryPanel::new(w, h));
//!
//! display
//!     .render_text(&["hello, world.".to_string()], TextOptions::default())
//!     .unwrap();
//! assert_eq!(display.width(), 128);
//! ```

mod epaper;
mod oled;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

pub use epaper::EPaper213;
pub use oled::Ssd1306;

use crate::error::{Error, PanelError};
use crate::image::Bitmap;
use crate::panel::Panel;
use crate::text::{auto_return, columns_for};
use crate::{CHAR_HEIGHT, CHAR_WIDTH, DEFAULT_LINE_MARGIN};

/// Prefix that marks operator-facing error text.
pub const ERROR_PREFIX: &str = "Error: ";

/// 5x8 glyphs advanced on an 8 pixel pitch, filling 8x8 character cells.
const CELL_FONT: MonoFont<'static> = MonoFont {
    character_spacing: CHAR_WIDTH - 5,
    ..FONT_5X8
};

/// Uniform contract over heterogeneous panels.
pub trait DisplayAdapter {
    /// Logical width in pixels, as seen by callers.
    fn width(&self) -> u32;

    /// Logical height in pixels, as seen by callers.
    fn height(&self) -> u32;

    /// Clear the panel and draw `lines` of text, one per character row.
    fn render_text(&mut self, lines: &[String], options: TextOptions) -> Result<(), PanelError>;

    /// Clear the panel and draw `bitmap` centered, clipping what falls outside.
    ///
    /// Returns [`Error::Image`] if a row fails to decode; in that case the
    /// panel is not flushed.
    fn render_image(&mut self, bitmap: Bitmap) -> Result<(), Error>;

    /// Show `message` as error text. Never fails.
    fn report_error(&mut self, message: &str);
}

impl<D: DisplayAdapter + ?Sized> DisplayAdapter for Box<D> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn render_text(&mut self, lines: &[String], options: TextOptions) -> Result<(), PanelError> {
        (**self).render_text(lines, options)
    }

    fn render_image(&mut self, bitmap: Bitmap) -> Result<(), Error> {
        (**self).render_image(bitmap)
    }

    fn report_error(&mut self, message: &str) {
        (**self).report_error(message)
    }
}

/// Options for [`DisplayAdapter::render_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    /// Blank pixels between character rows (default: 4)
    pub line_margin: u32,

    /// Wrap lines to the panel's character width (default: true)
    pub auto_return: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            line_margin: DEFAULT_LINE_MARGIN,
            auto_return: true,
        }
    }
}

impl TextOptions {
    /// Set the gap between character rows.
    #[must_use]
    pub fn with_line_margin(mut self, line_margin: u32) -> Self {
        self.line_margin = line_margin;
        self
    }

    /// Draw lines as given, letting long lines run off the panel.
    #[must_use]
    pub fn without_auto_return(mut self) -> Self {
        self.auto_return = false;
        self
    }
}

/// Mapping from logical coordinates to the native panel buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate 90 degrees clockwise (landscape on a portrait buffer)
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

/// Per-variant constants: logical size, rotation and polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Logical to native mapping
    pub rotation: Rotation,
    /// Panel value used to clear
    pub background: bool,
    /// Panel value used to draw
    pub foreground: bool,
    /// Vertical offset applied to every text row
    pub text_y_offset: i32,
}

impl Geometry {
    /// An unlit background means light image pixels become ink.
    pub fn background_is_dark(&self) -> bool {
        !self.background
    }

    /// Map an in-bounds logical coordinate to the native buffer.
    pub fn to_native(&self, x: u32, y: u32) -> (u32, u32) {
        match self.rotation {
            Rotation::Rotate0 => (x, y),
            Rotation::Rotate90 => (self.height - 1 - y, x),
            Rotation::Rotate180 => (self.width - 1 - x, self.height - 1 - y),
            Rotation::Rotate270 => (y, self.width - 1 - x),
        }
    }
}

/// Logical-coordinate drawing surface over a panel.
///
/// Applies rotation, clips to `[0, width) x [0, height)` and translates
/// [`BinaryColor::On`] into the panel's foreground value.
pub struct Canvas<'a, P: Panel> {
    panel: &'a mut P,
    geometry: Geometry,
}

impl<'a, P: Panel> Canvas<'a, P> {
    /// Wrap `panel` with the given geometry.
    pub fn new(panel: &'a mut P, geometry: Geometry) -> Self {
        Self { panel, geometry }
    }

    /// Fill the whole panel with the background value.
    pub fn clear(&mut self) {
        self.panel.fill(self.geometry.background);
    }

    /// Draw one foreground pixel; off-panel coordinates are dropped.
    pub fn plot(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x >= i64::from(self.geometry.width) || y >= i64::from(self.geometry.height)
        {
            return;
        }
        let (nx, ny) = self.geometry.to_native(x as u32, y as u32);
        self.panel.set_pixel(nx, ny, self.geometry.foreground);
    }

    /// Push the buffer to the hardware.
    pub fn flush(&mut self) -> Result<(), PanelError> {
        self.panel.flush()
    }
}

impl<P: Panel> OriginDimensions for Canvas<'_, P> {
    fn size(&self) -> Size {
        Size::new(self.geometry.width, self.geometry.height)
    }
}

impl<P: Panel> DrawTarget for Canvas<'_, P> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color.is_on() {
                self.plot(i64::from(point.x), i64::from(point.y));
            }
        }
        Ok(())
    }
}

/// Full-repaint text routine shared by all variants.
pub(crate) fn paint_text<P: Panel>(
    panel: &mut P,
    geometry: Geometry,
    lines: &[String],
    options: TextOptions,
) -> Result<(), PanelError> {
    let wrapped;
    let lines = if options.auto_return {
        wrapped = auto_return(lines, columns_for(geometry.width));
        wrapped.as_slice()
    } else {
        lines
    };

    let font = CELL_FONT;
    let style = MonoTextStyle::new(&font, BinaryColor::On);
    let pitch = i64::from(CHAR_HEIGHT) + i64::from(options.line_margin);

    let mut canvas = Canvas::new(panel, geometry);
    canvas.clear();
    for (i, line) in lines.iter().enumerate() {
        let y = (i as i64)
            .saturating_mul(pitch)
            .saturating_add(i64::from(geometry.text_y_offset));
        if y >= i64::from(geometry.height) {
            break;
        }
        let Ok(y) = i32::try_from(y) else {
            break;
        };
        tracing::debug!(line = %line, index = i, y, "drawing text line");
        Text::with_baseline(line.as_str(), Point::new(0, y), style, Baseline::Top)
            .draw(&mut canvas)
            .unwrap_or_else(|never| match never {});
    }
    canvas.flush()
}

/// Centered, clipped blit shared by all variants.
pub(crate) fn paint_bitmap<P: Panel>(
    panel: &mut P,
    geometry: Geometry,
    bitmap: Bitmap,
) -> Result<(), Error> {
    let x_offset = center_offset(geometry.width, bitmap.width());
    let y_offset = center_offset(geometry.height, bitmap.height());
    let ink_is_light = geometry.background_is_dark();

    // Image columns that land on the panel
    let image_width = i64::from(bitmap.width());
    let first_column = (-x_offset).clamp(0, image_width);
    let last_column = (i64::from(geometry.width) - x_offset).clamp(first_column, image_width);
    let visible = first_column as u32..last_column as u32;

    tracing::debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        x_offset,
        y_offset,
        "drawing bitmap"
    );

    let mut canvas = Canvas::new(panel, geometry);
    canvas.clear();
    let x_origin = first_column + x_offset;
    for (y, row) in bitmap.into_rows().columns(visible).enumerate() {
        let row = row?;
        let fixed_y = y as i64 + y_offset;
        if fixed_y < 0 {
            continue;
        }
        if fixed_y >= i64::from(geometry.height) {
            break;
        }
        for (x, &light) in row.iter().enumerate() {
            if light == ink_is_light {
                canvas.plot(x_origin + x as i64, fixed_y);
            }
        }
    }
    canvas.flush()?;
    Ok(())
}

/// Error text routine shared by all variants; logs instead of failing.
pub(crate) fn paint_error<P: Panel>(panel: &mut P, geometry: Geometry, message: &str) {
    tracing::warn!(error = message, "reporting error on panel");
    let lines = crate::text::split_lines(&format!("{}{}", ERROR_PREFIX, message));
    if let Err(err) = paint_text(panel, geometry, &lines, TextOptions::default()) {
        tracing::error!(%err, error_text = message, "failed to show error on panel");
    }
}

/// Floor of `(panel - image) / 2`; negative when the image is larger.
pub fn center_offset(panel: u32, image: u32) -> i64 {
    (i64::from(panel) - i64::from(image)).div_euclid(2)
}

/// Supported display variants, selected by name at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    /// SSD1306 128x64 I2C OLED
    Ssd1306,
    /// Waveshare 2.13" V3 e-paper, landscape
    EPaper213,
}

impl DisplayKind {
    /// Look up a variant by name, case-insensitively.
    ///
    /// Unknown names are a fatal configuration error.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name.trim().to_lowercase().as_str() {
            "ssd1306" | "oled" => Ok(DisplayKind::Ssd1306),
            "epaper213" | "epaper_2in13" | "epaper" => Ok(DisplayKind::EPaper213),
            _ => Err(Error::Config(format!("Unknown display device '{}'", name))),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            DisplayKind::Ssd1306 => "SSD1306",
            DisplayKind::EPaper213 => "EPAPER213",
        }
    }

    /// Native buffer size the variant's panel driver exposes.
    pub fn native_size(&self) -> (u32, u32) {
        match self {
            DisplayKind::Ssd1306 => (oled::DISPLAY_WIDTH, oled::DISPLAY_HEIGHT),
            DisplayKind::EPaper213 => (epaper::BUFFER_WIDTH, epaper::BUFFER_HEIGHT),
        }
    }

    /// Wrap `panel` in the adapter for this variant.
    pub fn build<P: Panel + 'static>(self, panel: P) -> Box<dyn DisplayAdapter> {
        match self {
            DisplayKind::Ssd1306 => Box::new(Ssd1306::new(panel)),
            DisplayKind::EPaper213 => Box::new(EPaper213::new(panel)),
        }
    }
}

impl FromStr for DisplayKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::MemoryPanel;

    fn geometry(rotation: Rotation) -> Geometry {
        Geometry {
            width: 16,
            height: 8,
            rotation,
            background: false,
            foreground: true,
            text_y_offset: 0,
        }
    }

    #[test]
    fn test_center_offset_floors() {
        assert_eq!(center_offset(128, 64), 32);
        assert_eq!(center_offset(128, 63), 32);
        assert_eq!(center_offset(64, 65), -1);
        assert_eq!(center_offset(10, 20), -5);
        assert_eq!(center_offset(10, 21), -6);
    }

    #[test]
    fn test_rotation_mapping() {
        assert_eq!(geometry(Rotation::Rotate0).to_native(3, 2), (3, 2));
        // Landscape 16x8 on an 8x16 buffer
        assert_eq!(geometry(Rotation::Rotate90).to_native(0, 0), (7, 0));
        assert_eq!(geometry(Rotation::Rotate90).to_native(15, 7), (0, 15));
        assert_eq!(geometry(Rotation::Rotate180).to_native(0, 0), (15, 7));
        assert_eq!(geometry(Rotation::Rotate270).to_native(0, 0), (0, 15));
    }

    #[test]
    fn test_canvas_clips() {
        let mut panel = MemoryPanel::new(16, 8);
        let mut canvas = Canvas::new(&mut panel, geometry(Rotation::Rotate0));
        canvas.plot(-1, 0);
        canvas.plot(0, -1);
        canvas.plot(16, 0);
        canvas.plot(0, 8);
        canvas.plot(15, 7);
        assert_eq!(panel.pixel_writes(), 1);
        assert_eq!(panel.pixel(15, 7), Some(true));
    }

    #[test]
    fn test_paint_text_draws_ink() {
        let mut panel = MemoryPanel::new(16, 8);
        paint_text(
            &mut panel,
            geometry(Rotation::Rotate0),
            &["AB".to_string()],
            TextOptions::default(),
        )
        .unwrap();
        assert!(panel.count(true) > 0);
        assert_eq!(panel.flushes(), 1);
    }

    #[test]
    fn test_paint_text_propagates_panel_error() {
        let mut panel = MemoryPanel::new(16, 8).with_failing_flush();
        let result = paint_text(
            &mut panel,
            geometry(Rotation::Rotate0),
            &["AB".to_string()],
            TextOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_paint_text_huge_margin_stops_at_panel_edge() {
        let mut panel = MemoryPanel::new(16, 8);
        paint_text(
            &mut panel,
            geometry(Rotation::Rotate0),
            &["A".to_string(), "B".to_string(), "C".to_string()],
            TextOptions::default()
                .with_line_margin(u32::MAX)
                .without_auto_return(),
        )
        .unwrap();

        let mut first_only = MemoryPanel::new(16, 8);
        paint_text(
            &mut first_only,
            geometry(Rotation::Rotate0),
            &["A".to_string()],
            TextOptions::default(),
        )
        .unwrap();
        assert_eq!(panel.pixels(), first_only.pixels());
    }

    #[test]
    fn test_paint_bitmap_clips_columns() {
        // 20x1 image on a 16 wide panel: x_offset = -2, y_offset = 3
        let mut row = vec![false; 20];
        row[2] = true;
        row[17] = true;
        row[1] = true;
        row[18] = true;
        let bitmap = Bitmap::from_rows(20, 1, vec![row]).unwrap();

        let mut panel = MemoryPanel::new(16, 8);
        paint_bitmap(&mut panel, geometry(Rotation::Rotate0), bitmap).unwrap();

        assert_eq!(panel.pixel_writes(), 2);
        assert_eq!(panel.pixel(0, 3), Some(true));
        assert_eq!(panel.pixel(15, 3), Some(true));
    }

    #[test]
    fn test_paint_error_never_fails() {
        let mut panel = MemoryPanel::new(16, 8).with_failing_flush();
        paint_error(&mut panel, geometry(Rotation::Rotate0), "boom");
    }

    #[derive(Clone, Default)]
    struct FieldLog(Arc<Mutex<Vec<(String, String)>>>);

    struct Collect<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for Collect<'_> {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldLog {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut fields = self.0.lock().unwrap();
            event.record(&mut Collect(&mut fields));
        }
    }

    #[test]
    fn test_paint_error_logs_text_as_error_field() {
        let log = FieldLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mut panel = MemoryPanel::new(16, 8);
            paint_error(&mut panel, geometry(Rotation::Rotate0), "boom");
        });

        let fields = log.0.lock().unwrap();
        let has = |name: &str, value: &str| {
            fields
                .iter()
                .any(|(n, v)| n.as_str() == name && v.as_str() == value)
        };
        assert!(has("message", "reporting error on panel"));
        assert!(has("error", "boom"));
    }

    #[test]
    fn test_display_kind_from_name() {
        assert_eq!(DisplayKind::from_name("SSD1306").unwrap(), DisplayKind::Ssd1306);
        assert_eq!(DisplayKind::from_name("ssd1306").unwrap(), DisplayKind::Ssd1306);
        assert_eq!(
            DisplayKind::from_name("EPaper_2in13").unwrap(),
            DisplayKind::EPaper213
        );
        assert!(matches!(
            DisplayKind::from_name("crt"),
            Err(Error::Config(msg)) if msg.contains("crt")
        ));
        assert_eq!("oled".parse::<DisplayKind>().unwrap(), DisplayKind::Ssd1306);
    }

    #[test]
    fn test_display_kind_build() {
        let (w, h) = DisplayKind::EPaper213.native_size();
        let display = DisplayKind::EPaper213.build(MemoryPanel::new(w, h));
        assert_eq!(display.width(), 250);
        assert_eq!(display.height(), 122);

        let (w, h) = DisplayKind::Ssd1306.native_size();
        let display = DisplayKind::Ssd1306.build(MemoryPanel::new(w, h));
        assert_eq!((display.width(), display.height()), (128, 64));
    }

    #[test]
    fn test_text_options_builder() {
        let options = TextOptions::default().with_line_margin(2).without_auto_return();
        assert_eq!(options.line_margin, 2);
        assert!(!options.auto_return);
    }
}
