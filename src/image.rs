//! PNG image pipeline.
//!
//! Turns a PNG payload into a [`Bitmap`] and hands it to a display adapter.
//! Only single-channel, 1-bit, alpha-free images are accepted; each check
//! fails with its own [`ImageError`] and the payload is never drawn:
//!
//! | Check | Message on the panel |
//! |-------|----------------------|
//! | PNG structure | `Invalid image data: <reason>` |
//! | Greyscale | `not a greyscale image` |
//! | No alpha | `alpha not supported` |
//! | 1 bit per sample | `bitdepth is not 1` |
//!
//! In a 1-bit greyscale PNG a set sample is white, so `true` in a bitmap row
//! means "light".
//!
//! # Example
//!
//! ```
//! use pollpanel::image::decode_png;
//!
//! let err = decode_png(b"definitely not a png").unwrap_err();
//! assert!(err.to_string().starts_with("Invalid image data"));
//! ```

use std::io::Cursor;
use std::ops::Range;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::display::DisplayAdapter;
use crate::error::{Error, ImageError, PanelError};
use crate::poller::CycleOutcome;

/// Largest accepted image side, in pixels.
pub const MAX_IMAGE_SIDE: u32 = 2048;

/// Memory the PNG decoder may allocate for one payload.
const DECODE_LIMIT_BYTES: usize = 1 << 20;

/// A decoded monochrome image.
///
/// Rows are unpacked on demand and can be consumed exactly once.
pub struct Bitmap {
    width: u32,
    height: u32,
    rows: Rows,
}

impl Bitmap {
    /// Build a bitmap from already decoded rows.
    ///
    /// Fails unless there are exactly `height` rows of `width` cells.
    pub fn from_rows(width: u32, height: u32, rows: Vec<Vec<bool>>) -> Result<Self, ImageError> {
        if rows.len() != height as usize {
            return Err(ImageError::InvalidData(format!(
                "expected {} rows, got {}",
                height,
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != width as usize) {
            return Err(ImageError::InvalidData(format!(
                "expected rows of {} pixels, got {}",
                width,
                row.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rows: Rows::new(width, height, RowSource::Memory(rows.into_iter())),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Consume the bitmap, yielding its rows top to bottom.
    pub fn into_rows(self) -> Rows {
        self.rows
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Forward-only row sequence of a [`Bitmap`].
///
/// Yields exactly `height` items unless a row is missing, in which case the
/// error is yielded once and the sequence ends.
pub struct Rows {
    columns: Range<u32>,
    remaining: u32,
    source: RowSource,
}

const ENDED_EARLY: &str = "image data ended early";

enum RowSource {
    /// Whole decoded frame, packed rows of `line_size` bytes
    Packed {
        data: Vec<u8>,
        line_size: usize,
        next: usize,
    },
    Memory(std::vec::IntoIter<Vec<bool>>),
}

impl Rows {
    fn new(width: u32, height: u32, source: RowSource) -> Self {
        Self {
            columns: 0..width,
            remaining: height,
            source,
        }
    }

    /// Restrict every yielded row to the cells in `columns`.
    ///
    /// The range is clamped to the image width. Cells outside it are never
    /// unpacked.
    #[must_use]
    pub fn columns(mut self, columns: Range<u32>) -> Self {
        let end = columns.end.min(self.columns.end);
        let start = columns.start.min(end);
        self.columns = start..end;
        self
    }

    fn fail(&mut self, reason: impl Into<String>) -> Option<Result<Vec<bool>, ImageError>> {
        self.remaining = 0;
        Some(Err(ImageError::InvalidData(reason.into())))
    }
}

impl Iterator for Rows {
    type Item = Result<Vec<bool>, ImageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let columns = self.columns.clone();
        let row = match &mut self.source {
            RowSource::Packed {
                data,
                line_size,
                next,
            } => {
                let start = *next * *line_size;
                *next += 1;
                data.get(start..start + *line_size)
                    .map(|line| unpack_row(line, columns))
                    .ok_or_else(|| ENDED_EARLY.to_string())
            }
            RowSource::Memory(rows) => rows
                .next()
                .map(|row| row[columns.start as usize..columns.end as usize].to_vec())
                .ok_or_else(|| ENDED_EARLY.to_string()),
        };

        match row {
            Ok(row) => Some(Ok(row)),
            Err(reason) => self.fail(reason),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Expand the `columns` cells of one packed 1-bit scanline (MSB first).
fn unpack_row(data: &[u8], columns: Range<u32>) -> Vec<bool> {
    columns
        .map(|x| x as usize)
        .map(|x| data.get(x / 8).is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0))
        .collect()
}

/// Decode and validate a PNG payload.
///
/// The whole image is decompressed here, so a truncated or corrupt payload
/// fails before anything is drawn. Images wider or taller than
/// [`MAX_IMAGE_SIDE`] are rejected.
pub fn decode_png(bytes: &[u8]) -> Result<Bitmap, ImageError> {
    let limits = png::Limits {
        bytes: DECODE_LIMIT_BYTES,
    };
    let mut decoder = png::Decoder::new_with_limits(Cursor::new(bytes), limits);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageError::InvalidData(e.to_string()))?;

    let info = reader.info();
    let (width, height) = (info.width, info.height);
    validate_format(info.color_type, info.bit_depth)?;
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(ImageError::InvalidData(format!(
            "image too large: {}x{}",
            width, height
        )));
    }

    let mut data = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut data)
        .map_err(|e| ImageError::InvalidData(e.to_string()))?;

    Ok(Bitmap {
        width,
        height,
        rows: Rows::new(
            width,
            height,
            RowSource::Packed {
                data,
                line_size: frame.line_size,
                next: 0,
            },
        ),
    })
}

fn validate_format(color_type: png::ColorType, bit_depth: png::BitDepth) -> Result<(), ImageError> {
    match color_type {
        png::ColorType::Grayscale => {}
        png::ColorType::GrayscaleAlpha => return Err(ImageError::AlphaNotSupported),
        _ => return Err(ImageError::NotGreyscale),
    }
    if bit_depth != png::BitDepth::One {
        return Err(ImageError::BitDepth);
    }
    Ok(())
}

/// Decode a base64 image payload, ignoring embedded whitespace.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, ImageError> {
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(cleaned)
        .map_err(|e| ImageError::InvalidData(e.to_string()))
}

/// Decode `bytes` and draw the image centered on `display`.
///
/// Image problems are shown on the panel and reported as
/// [`CycleOutcome::Errored`]; only panel failures are returned as errors.
pub fn show_png<D>(display: &mut D, bytes: &[u8]) -> Result<CycleOutcome, PanelError>
where
    D: DisplayAdapter + ?Sized,
{
    let bitmap = match decode_png(bytes) {
        Ok(bitmap) => bitmap,
        Err(err) => return Ok(reject(display, err.into())),
    };

    tracing::info!(
        width = bitmap.width(),
        height = bitmap.height(),
        "showing image"
    );
    match display.render_image(bitmap) {
        Ok(()) => Ok(CycleOutcome::Displayed),
        Err(Error::Panel(err)) => Err(err),
        Err(err) => Ok(reject(display, err)),
    }
}

/// Decode a base64 payload and draw it like [`show_png`].
pub fn show_base64_png<D>(display: &mut D, text: &str) -> Result<CycleOutcome, PanelError>
where
    D: DisplayAdapter + ?Sized,
{
    match decode_base64(text) {
        Ok(bytes) => show_png(display, &bytes),
        Err(err) => Ok(reject(display, err.into())),
    }
}

fn reject<D: DisplayAdapter + ?Sized>(display: &mut D, err: Error) -> CycleOutcome {
    let message = err.to_string();
    tracing::warn!(error = %message, "image rejected");
    display.report_error(&message);
    CycleOutcome::Errored(message)
}
