//! Panel driver contract.
//!
//! A [`Panel`] is the opaque peripheral behind a display adapter: a fixed-size
//! one-bit pixel buffer plus a way to push that buffer to the glass. Bus
//! timing and controller command sequences live entirely inside the driver.
//!
//! Pixel values are the driver's raw bit. Which value reads as "ink" depends
//! on the panel (an OLED lights `true`, an e-paper buffer shows `true` as
//! white), so adapters carry their own background/foreground constants.
//!
//! [`MemoryPanel`] is a host-side framebuffer used by tests and demos.

use crate::error::PanelError;

/// Narrow interface to a physical monochrome panel.
pub trait Panel {
    /// Native buffer width in pixels (before any rotation).
    fn width(&self) -> u32;

    /// Native buffer height in pixels (before any rotation).
    fn height(&self) -> u32;

    /// Set every pixel of the buffer to `value`.
    fn fill(&mut self, value: bool);

    /// Write one pixel. Out-of-range coordinates are ignored.
    fn set_pixel(&mut self, x: u32, y: u32, value: bool);

    /// Transfer the buffer to the hardware and refresh the glass.
    fn flush(&mut self) -> Result<(), PanelError>;
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn fill(&mut self, value: bool) {
        (**self).fill(value)
    }

    fn set_pixel(&mut self, x: u32, y: u32, value: bool) {
        (**self).set_pixel(x, y, value)
    }

    fn flush(&mut self) -> Result<(), PanelError> {
        (**self).flush()
    }
}

/// In-memory panel buffer.
///
/// Counts pixel writes and flushes so callers can observe exactly what an
/// adapter did to the buffer.
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
    pixel_writes: usize,
    flushes: usize,
    fail_flush: bool,
}

impl MemoryPanel {
    /// Create a blank (all `false`) panel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; (width as usize) * (height as usize)],
            pixel_writes: 0,
            flushes: 0,
            fail_flush: false,
        }
    }

    /// Make every subsequent flush fail, simulating a bus fault.
    #[must_use]
    pub fn with_failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    /// Read one pixel; `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Raw buffer, row-major.
    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Number of pixels set to `value`.
    pub fn count(&self, value: bool) -> usize {
        self.pixels.iter().filter(|&&p| p == value).count()
    }

    /// Number of `set_pixel` calls since creation or the last reset.
    pub fn pixel_writes(&self) -> usize {
        self.pixel_writes
    }

    /// Number of successful flushes.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Reset the write and flush counters.
    pub fn reset_counters(&mut self) {
        self.pixel_writes = 0;
        self.flushes = 0;
    }

    /// Render the buffer as text, `#` for `true` and `.` for `false`.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.pixels.len() + self.height as usize);
        for row in self.pixels.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|&p| if p { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}

impl Panel for MemoryPanel {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill(&mut self, value: bool) {
        self.pixels.iter_mut().for_each(|p| *p = value);
    }

    fn set_pixel(&mut self, x: u32, y: u32, value: bool) {
        self.pixel_writes += 1;
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = value;
        }
    }

    fn flush(&mut self) -> Result<(), PanelError> {
        if self.fail_flush {
            return Err(PanelError::new("simulated bus fault"));
        }
        self.flushes += 1;
        Ok(())
    }
}
