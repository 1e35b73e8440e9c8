//! Waveshare 2.13" V3 e-paper adapter, landscape orientation.
//!
//! The controller's buffer is portrait, 128 columns (122 of them wired to
//! the glass) by 250 rows. The adapter rotates it into a 250x122 landscape
//! surface. E-paper polarity is inverted compared to an OLED: a set bit is
//! white, so the background is `true` and ink is `false`.
//!
//! Refreshing e-paper takes seconds; every render still flushes exactly once.

use super::{paint_bitmap, paint_error, paint_text, DisplayAdapter, Geometry, Rotation, TextOptions};
use crate::error::{Error, PanelError};
use crate::image::Bitmap;
use crate::panel::Panel;

/// Native buffer width (byte-aligned)
pub const BUFFER_WIDTH: u32 = 128;

/// Native buffer height
pub const BUFFER_HEIGHT: u32 = 250;

/// Buffer columns that are actually visible
pub const VISIBLE_ROWS: u32 = 122;

/// Text starts one character row down to clear the bezel.
const TEXT_Y_OFFSET: i32 = 8;

/// Landscape e-paper adapter.
#[derive(Debug)]
pub struct EPaper213<P: Panel> {
    panel: P,
    geometry: Geometry,
}

impl<P: Panel> EPaper213<P> {
    /// Wrap a portrait e-paper panel driver.
    pub fn new(panel: P) -> Self {
        let geometry = Geometry {
            width: panel.height(),
            height: panel.width().min(VISIBLE_ROWS),
            rotation: Rotation::Rotate90,
            background: true,
            foreground: false,
            text_y_offset: TEXT_Y_OFFSET,
        };
        Self { panel, geometry }
    }

    /// Borrow the underlying panel driver.
    pub fn panel(&self) -> &P {
        &self.panel
    }
}

impl<P: Panel> DisplayAdapter for EPaper213<P> {
    fn width(&self) -> u32 {
        self.geometry.width
    }

    fn height(&self) -> u32 {
        self.geometry.height
    }

    fn render_text(&mut self, lines: &[String], options: TextOptions) -> Result<(), PanelError> {
        paint_text(&mut self.panel, self.geometry, lines, options)
    }

    fn render_image(&mut self, bitmap: Bitmap) -> Result<(), Error> {
        paint_bitmap(&mut self.panel, self.geometry, bitmap)
    }

    fn report_error(&mut self, message: &str) {
        paint_error(&mut self.panel, self.geometry, message)
    }
}
