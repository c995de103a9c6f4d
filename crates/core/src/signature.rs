//! Handwritten signature capture.
//!
//! [`SignaturePad`] is an ink surface driven by pointer events. Strokes are
//! kept in CSS pixel coordinates and rasterized into a backing buffer of
//! `css size × device pixel ratio`, so a resize rebuilds the buffer under
//! the new transform instead of stretching stale pixels. The flattened
//! surface is exported as a base64 PNG data URI.
//!
//! [`validate_data_uri`] performs the same emptiness check on an incoming
//! data URI, for callers that receive the image instead of drawing it.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;

use crate::lifecycle::{self, AssignmentStatus};

/// Prefix of every data URI this module produces or accepts.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Upper bound on either backing-buffer dimension, in device pixels.
pub const MAX_SURFACE_PX: u32 = 4096;

/// Upper bound on an accepted data URI, in bytes.
pub const MAX_DATA_URI_BYTES: usize = 2 * 1024 * 1024;

/// Pen width in CSS pixels.
pub const STROKE_WIDTH: f64 = 2.5;

const INK: Rgba<u8> = Rgba([17, 24, 39, 255]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No visible ink on the surface.
    #[error("Bitte unterschreiben Sie zuerst.")]
    Empty,

    #[error("Signature not allowed while the assignment is {0}")]
    NotAllowed(AssignmentStatus),

    #[error("Invalid drawing surface: {0}")]
    InvalidSurface(String),

    #[error("Invalid signature image: {0}")]
    InvalidDataUri(String),

    #[error("Failed to encode signature: {0}")]
    Encode(String),
}

/// Pointer or touch input, already relative to the surface's top-left
/// corner in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Leave,
    Cancel,
}

#[derive(Debug, Clone, Default)]
struct Stroke {
    points: Vec<(f64, f64)>,
}

/// Request body of `POST /me/assignments/{id}/signatures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSubmission {
    pub signature_data: String,
}

pub struct SignaturePad {
    device_pixel_ratio: f64,
    buffer: RgbaImage,
    strokes: Vec<Stroke>,
    drawing: bool,
}

impl SignaturePad {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Result<Self, SignatureError> {
        let buffer = allocate(css_width, css_height, device_pixel_ratio)?;
        Ok(Self {
            device_pixel_ratio,
            buffer,
            strokes: Vec::new(),
            drawing: false,
        })
    }

    /// Backing buffer size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => self.begin_stroke(x, y),
            PointerEvent::Move { x, y } => self.extend_stroke(x, y),
            PointerEvent::Up | PointerEvent::Leave | PointerEvent::Cancel => self.drawing = false,
        }
    }

    fn begin_stroke(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.strokes.push(Stroke {
            points: vec![(x, y)],
        });
        self.drawing = true;
    }

    fn extend_stroke(&mut self, x: f64, y: f64) {
        if !self.drawing || !(x.is_finite() && y.is_finite()) {
            return;
        }
        let Some(stroke) = self.strokes.last_mut() else {
            return;
        };
        let Some(&from) = stroke.points.last() else {
            return;
        };
        stroke.points.push((x, y));
        let transform = self.device_pixel_ratio;
        let radius = STROKE_WIDTH * transform / 2.0;
        draw_segment(
            &mut self.buffer,
            (from.0 * transform, from.1 * transform),
            (x * transform, y * transform),
            radius,
        );
    }

    /// Rebuild the backing buffer for a new CSS size or device pixel ratio
    /// and re-rasterize every stroke under the new transform.
    pub fn resize(
        &mut self,
        css_width: f64,
        css_height: f64,
        device_pixel_ratio: f64,
    ) -> Result<(), SignatureError> {
        self.buffer = allocate(css_width, css_height, device_pixel_ratio)?;
        self.device_pixel_ratio = device_pixel_ratio;

        let radius = STROKE_WIDTH * device_pixel_ratio / 2.0;
        for stroke in &self.strokes {
            for pair in stroke.points.windows(2) {
                draw_segment(
                    &mut self.buffer,
                    (pair[0].0 * device_pixel_ratio, pair[0].1 * device_pixel_ratio),
                    (pair[1].0 * device_pixel_ratio, pair[1].1 * device_pixel_ratio),
                    radius,
                );
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// True when every pixel of the backing buffer is fully transparent.
    pub fn is_blank(&self) -> bool {
        is_transparent(&self.buffer)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, SignatureError> {
        let (width, height) = self.buffer.dimensions();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(self.buffer.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| SignatureError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Flatten the surface to a PNG data URI. Refuses a blank surface.
    pub fn to_data_uri(&self) -> Result<String, SignatureError> {
        if self.is_blank() {
            return Err(SignatureError::Empty);
        }
        let png = self.to_png()?;
        Ok(format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png)))
    }

    /// Build the upstream payload, gated by the assignment status.
    ///
    /// Both checks run before anything touches the network.
    pub fn submission(&self, status: AssignmentStatus) -> Result<SignatureSubmission, SignatureError> {
        if !lifecycle::signature_allowed(status) {
            return Err(SignatureError::NotAllowed(status));
        }
        Ok(SignatureSubmission {
            signature_data: self.to_data_uri()?,
        })
    }
}

impl std::fmt::Debug for SignaturePad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePad")
            .field("device_pixel_ratio", &self.device_pixel_ratio)
            .field("strokes", &self.strokes.len())
            .field("drawing", &self.drawing)
            .finish()
    }
}

fn allocate(css_width: f64, css_height: f64, dpr: f64) -> Result<RgbaImage, SignatureError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !(valid(css_width) && valid(css_height) && valid(dpr)) {
        return Err(SignatureError::InvalidSurface(format!(
            "size {css_width}x{css_height} at ratio {dpr}"
        )));
    }
    let width = (css_width * dpr).round().max(1.0);
    let height = (css_height * dpr).round().max(1.0);
    if width > f64::from(MAX_SURFACE_PX) || height > f64::from(MAX_SURFACE_PX) {
        return Err(SignatureError::InvalidSurface(format!(
            "backing buffer {width}x{height} exceeds {MAX_SURFACE_PX}px"
        )));
    }
    Ok(RgbaImage::new(width as u32, height as u32))
}

/// Stamp round pen dots along the segment, half a pixel apart.
fn draw_segment(buffer: &mut RgbaImage, from: (f64, f64), to: (f64, f64), radius: f64) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = ((dx * dx + dy * dy).sqrt() * 2.0).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = f64::from(i) / f64::from(steps);
        stamp(buffer, from.0 + dx * t, from.1 + dy * t, radius.max(0.5));
    }
}

fn stamp(buffer: &mut RgbaImage, cx: f64, cy: f64, radius: f64) {
    let (width, height) = buffer.dimensions();
    let min_x = (cx - radius).floor().max(0.0) as u32;
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_x = ((cx + radius).ceil().max(0.0) as u32).min(width.saturating_sub(1));
    let max_y = ((cy + radius).ceil().max(0.0) as u32).min(height.saturating_sub(1));
    if cx + radius < 0.0 || cy + radius < 0.0 || min_x >= width || min_y >= height {
        return;
    }
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = f64::from(x) + 0.5 - cx;
            let py = f64::from(y) + 0.5 - cy;
            if px * px + py * py <= r2 {
                buffer.put_pixel(x, y, INK);
            }
        }
    }
}

fn is_transparent(buffer: &RgbaImage) -> bool {
    buffer.pixels().all(|p| p[3] == 0)
}

/// Dimensions of an accepted signature image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedSignature {
    pub width: u32,
    pub height: u32,
}

/// Check an incoming PNG data URI: prefix, size, decodability and that at
/// least one pixel is not fully transparent.
pub fn validate_data_uri(raw: &str) -> Result<ValidatedSignature, SignatureError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SignatureError::Empty);
    }
    if raw.len() > MAX_DATA_URI_BYTES {
        return Err(SignatureError::InvalidDataUri(format!(
            "payload exceeds {MAX_DATA_URI_BYTES} bytes"
        )));
    }
    let encoded = raw
        .strip_prefix(PNG_DATA_URI_PREFIX)
        .ok_or_else(|| SignatureError::InvalidDataUri("expected a PNG data URI".to_string()))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| SignatureError::InvalidDataUri(format!("base64: {e}")))?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| SignatureError::InvalidDataUri(format!("png: {e}")))?
        .to_rgba8();
    if is_transparent(&image) {
        return Err(SignatureError::Empty);
    }
    Ok(ValidatedSignature {
        width: image.width(),
        height: image.height(),
    })
}

/// A PNG data URI of a fully transparent image, used when a caller needs
/// a well-formed but empty signature.
pub fn blank_data_uri(width: u32, height: u32) -> Result<String, SignatureError> {
    let buffer = RgbaImage::new(width.max(1), height.max(1));
    let mut bytes = Cursor::new(Vec::new());
    buffer
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| SignatureError::Encode(e.to_string()))?;
    Ok(format!(
        "{PNG_DATA_URI_PREFIX}{}",
        STANDARD.encode(bytes.into_inner())
    ))
}
