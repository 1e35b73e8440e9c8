//! SSD1306 I2C OLED adapter.

use super::{paint_bitmap, paint_error, paint_text, DisplayAdapter, Geometry, Rotation, TextOptions};
use crate::error::{Error, PanelError};
use crate::image::Bitmap;
use crate::panel::Panel;

/// SSD1306 panel width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// SSD1306 panel height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// OLED adapter: lit pixels on a dark background, native orientation.
#[derive(Debug)]
pub struct Ssd1306<P: Panel> {
    panel: P,
    geometry: Geometry,
}

impl<P: Panel> Ssd1306<P> {
    /// Wrap an SSD1306 panel driver.
    pub fn new(panel: P) -> Self {
        let geometry = Geometry {
            width: panel.width(),
            height: panel.height(),
            rotation: Rotation::Rotate0,
            background: false,
            foreground: true,
            text_y_offset: 0,
        };
        Self { panel, geometry }
    }

    /// Borrow the underlying panel driver.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Release the panel driver.
    pub fn into_panel(self) -> P {
        self.panel
    }
}

impl<P: Panel> DisplayAdapter for Ssd1306<P> {
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
