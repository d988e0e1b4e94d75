//! Crop, zoom and pan of the article image before upload.
//!
//! The user positions a picture inside a fixed-aspect viewport. Scale never
//! drops below the "cover" scale and translation is clamped per axis, so the
//! viewport is always completely filled with image content. [`ImageAdjuster::export`]
//! rasterizes exactly what the viewport shows into a fixed-size JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage};
use log::{debug, warn};

use crate::error::ValidationError;

/// Largest accepted upload: 5 MiB
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Tolerance used when comparing scaled sizes against the viewport
const COVER_EPSILON: f64 = 1e-9;

/// A file picked by the user
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        SelectedFile {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Geometry and encoding settings of the adjuster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustConfig {
    /// Viewport size in CSS pixels (15:11 by default)
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Exported image size in pixels
    pub output_width: u32,
    pub output_height: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    pub max_bytes: usize,
    /// Upper zoom bound as a multiple of the cover scale
    pub max_zoom_factor: f64,
}

impl Default for AdjustConfig {
    fn default() -> Self {
        AdjustConfig {
            viewport_width: 300.0,
            viewport_height: 220.0,
            output_width: 1500,
            output_height: 1100,
            jpeg_quality: 92,
            max_bytes: MAX_IMAGE_BYTES,
            max_zoom_factor: 4.0,
        }
    }
}

/// Where the adjuster is in its lifecycle
///
/// Selection validates the file and initializes the transform in one step,
/// so a successful `select` lands directly in `Adjusting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustState {
    Empty,
    Adjusting,
    /// An export has been produced; further adjustment is still allowed.
    Exported,
}

/// Scale and translation of the image relative to the viewport centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Source {
    name: String,
    width: u32,
    height: u32,
    pixels: Option<DynamicImage>,
}

#[derive(Debug, Clone, Copy)]
struct DragAnchor {
    x: f64,
    y: f64,
}

/// Minimum magnification at which an image fills a viewport
///
/// `max(viewport_w / image_w, viewport_h / image_h)`
pub fn cover_scale(viewport_w: f64, viewport_h: f64, image_w: f64, image_h: f64) -> f64 {
    if image_w <= 0.0 || image_h <= 0.0 || viewport_w <= 0.0 || viewport_h <= 0.0 {
        return 1.0;
    }
    (viewport_w / image_w).max(viewport_h / image_h)
}

/// Clamp one translation axis so the scaled image keeps covering the viewport
///
/// The allowed range is `[-overflow, overflow]` with
/// `overflow = (scaled - viewport) / 2`. When the image is no larger than the
/// viewport on that axis it stays centred.
pub fn clamp_axis(translate: f64, scaled_size: f64, viewport_size: f64) -> f64 {
    if !translate.is_finite() || scaled_size <= viewport_size {
        return 0.0;
    }
    let overflow = (scaled_size - viewport_size) / 2.0;
    translate.clamp(-overflow, overflow)
}

/// Image adjustment engine used by the submission form
#[derive(Debug, Clone)]
pub struct ImageAdjuster {
    config: AdjustConfig,
    state: AdjustState,
    source: Option<Source>,
    transform: Transform,
    min_scale: f64,
    drag: Option<DragAnchor>,
}

impl Default for ImageAdjuster {
    fn default() -> Self {
        ImageAdjuster::new(AdjustConfig::default())
    }
}

impl ImageAdjuster {
    pub fn new(config: AdjustConfig) -> Self {
        ImageAdjuster {
            config,
            state: AdjustState::Empty,
            source: None,
            transform: Transform::default(),
            min_scale: 1.0,
            drag: None,
        }
    }

    /// Accept a user-selected file
    ///
    /// The MIME type must be `image/*` and the file at most `max_bytes` long,
    /// and its contents must decode as an image. On any failure the adjuster
    /// is left exactly as it was.
    ///
    /// # Arguments
    /// * `file` - The picked file with its declared MIME type
    ///
    /// # Returns
    /// * `Result<(), ValidationError>` - The rejection reason, if rejected
    pub fn select(&mut self, file: SelectedFile) -> Result<(), ValidationError> {
        if !file.mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage);
        }
        if file.size() > self.config.max_bytes {
            return Err(ValidationError::ImageTooLarge);
        }

        let decoded = image::load_from_memory(&file.bytes).map_err(|e| {
            warn!("Failed to decode selected image {}: {}", file.name, e);
            ValidationError::UnreadableImage
        })?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ValidationError::UnreadableImage);
        }

        self.install(Source {
            name: file.name,
            width,
            height,
            pixels: Some(decoded),
        });
        Ok(())
    }

    /// Set up the transform for an image known only by its natural size
    ///
    /// Geometry behaves as with [`ImageAdjuster::select`]; exporting is not
    /// possible because there are no pixels.
    pub fn select_dimensions(&mut self, width: u32, height: u32) -> Result<(), ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::UnreadableImage);
        }
        self.install(Source {
            name: String::new(),
            width,
            height,
            pixels: None,
        });
        Ok(())
    }

    fn install(&mut self, source: Source) {
        self.min_scale = cover_scale(
            self.config.viewport_width,
            self.config.viewport_height,
            source.width as f64,
            source.height as f64,
        );
        debug!(
            "Selected {}x{} image, cover scale {:.4}",
            source.width, source.height, self.min_scale
        );

        self.source = Some(source);
        self.transform = Transform {
            scale: self.min_scale,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        self.drag = None;
        self.state = AdjustState::Adjusting;
    }

    /// Request a new zoom level
    ///
    /// The value is clamped into `[min_scale, max_scale]` and the translation
    /// is re-clamped for the new image size. Ignored when no image is selected.
    pub fn set_scale(&mut self, requested: f64) {
        if self.source.is_none() || !requested.is_finite() {
            return;
        }
        self.transform.scale = requested.clamp(self.min_scale, self.max_scale());
        self.clamp_translation();
    }

    /// Zoom slider position, in percent of natural size
    pub fn zoom_percent(&self) -> u32 {
        (self.transform.scale * 100.0).round().max(0.0) as u32
    }

    pub fn set_zoom_percent(&mut self, percent: f64) {
        self.set_scale(percent / 100.0);
    }

    /// Move the image by a delta in viewport pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if self.source.is_none() {
            return;
        }
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
        self.clamp_translation();
    }

    /// Place the image at an absolute offset from the centre
    pub fn set_translation(&mut self, x: f64, y: f64) {
        if self.source.is_none() {
            return;
        }
        self.transform.translate_x = x;
        self.transform.translate_y = y;
        self.clamp_translation();
    }

    /// Start a mouse or single-touch drag at a pointer position
    pub fn begin_drag(&mut self, pointer_x: f64, pointer_y: f64) {
        if self.source.is_none() {
            return;
        }
        self.drag = Some(DragAnchor {
            x: pointer_x - self.transform.translate_x,
            y: pointer_y - self.transform.translate_y,
        });
    }

    /// Follow the pointer during a drag; ignored when no drag is active
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) {
        if let Some(anchor) = self.drag {
            self.set_translation(pointer_x - anchor.x, pointer_y - anchor.y);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn clamp_translation(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let scaled_w = source.width as f64 * self.transform.scale;
        let scaled_h = source.height as f64 * self.transform.scale;

        self.transform.translate_x =
            clamp_axis(self.transform.translate_x, scaled_w, self.config.viewport_width);
        self.transform.translate_y =
            clamp_axis(self.transform.translate_y, scaled_h, self.config.viewport_height);
    }

    /// Export at the configured output size
    pub fn export(&mut self) -> Option<Vec<u8>> {
        self.export_to(self.config.output_width, self.config.output_height)
    }

    /// Rasterize what the viewport shows to a JPEG of `output_w` x `output_h`
    ///
    /// With `k = output_w / viewport_w` the source is drawn at
    /// `natural * scale * k`, centred at `(output_w / 2 + tx * k, output_h / 2 + ty * k)`
    /// over a black background.
    ///
    /// # Returns
    /// * `Option<Vec<u8>>` - Encoded JPEG, or `None` without an image or on encoder failure
    pub fn export_to(&mut self, output_w: u32, output_h: u32) -> Option<Vec<u8>> {
        let source = self.source.as_ref()?;
        let pixels = source.pixels.as_ref()?;
        if output_w == 0 || output_h == 0 {
            return None;
        }

        let canvas = render_crop(
            pixels,
            &self.transform,
            self.config.viewport_width,
            output_w,
            output_h,
        );

        let mut encoded = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, self.config.jpeg_quality);
        if let Err(e) = encoder.encode(canvas.as_raw(), output_w, output_h, ColorType::Rgb8) {
            warn!("Error creating adjusted image: {}", e);
            return None;
        }

        debug!(
            "Exported {} as {}x{} JPEG ({} bytes)",
            source.name,
            output_w,
            output_h,
            encoded.len()
        );
        self.state = AdjustState::Exported;
        Some(encoded)
    }

    /// Drop the selected image and its transform
    pub fn remove(&mut self) {
        self.source = None;
        self.transform = Transform::default();
        self.min_scale = 1.0;
        self.drag = None;
        self.state = AdjustState::Empty;
    }

    /// Form close: same as removing the image
    pub fn reset(&mut self) {
        self.remove();
    }

    /// Whether the current transform leaves no background visible
    pub fn covers_viewport(&self) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        let t = &self.transform;
        let half_w = source.width as f64 * t.scale / 2.0;
        let half_h = source.height as f64 * t.scale / 2.0;
        let vw = self.config.viewport_width / 2.0;
        let vh = self.config.viewport_height / 2.0;

        t.translate_x - half_w <= -vw + COVER_EPSILON
            && t.translate_x + half_w >= vw - COVER_EPSILON
            && t.translate_y - half_h <= -vh + COVER_EPSILON
            && t.translate_y + half_h >= vh - COVER_EPSILON
    }

    pub fn state(&self) -> AdjustState {
        self.state
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.min_scale * self.config.max_zoom_factor.max(1.0)
    }

    pub fn config(&self) -> &AdjustConfig {
        &self.config
    }

    /// Natural size of the selected image
    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.source.as_ref().map(|s| (s.width, s.height))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }
}

// Draws the visible part of `pixels` onto a black canvas. Only the region of
// the source that lands inside the canvas is cropped and resampled, and it is
// placed where the full drawn image would put it, so every output pixel maps
// back to the same source position as the on-screen preview.
fn render_crop(
    pixels: &DynamicImage,
    transform: &Transform,
    viewport_w: f64,
    output_w: u32,
    output_h: u32,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(output_w, output_h, Rgb([0, 0, 0]));

    let (img_w, img_h) = pixels.dimensions();
    let k = output_w as f64 / viewport_w;
    let px_scale = transform.scale * k;
    if !px_scale.is_finite() || px_scale <= 0.0 {
        return canvas;
    }

    let draw_w = img_w as f64 * px_scale;
    let draw_h = img_h as f64 * px_scale;
    let left = output_w as f64 / 2.0 - draw_w / 2.0 + transform.translate_x * k;
    let top = output_h as f64 / 2.0 - draw_h / 2.0 + transform.translate_y * k;

    let x0 = left.max(0.0);
    let y0 = top.max(0.0);
    let x1 = (left + draw_w).min(output_w as f64);
    let y1 = (top + draw_h).min(output_h as f64);
    if x1 <= x0 || y1 <= y0 {
        return canvas;
    }

    // Visible rectangle expressed in whole source pixels
    let src_x = (((x0 - left) / px_scale).floor().max(0.0) as u32).min(img_w - 1);
    let src_y = (((y0 - top) / px_scale).floor().max(0.0) as u32).min(img_h - 1);
    let src_x_end = (((x1 - left) / px_scale).ceil().max(0.0) as u32).clamp(src_x + 1, img_w);
    let src_y_end = (((y1 - top) / px_scale).ceil().max(0.0) as u32).clamp(src_y + 1, img_h);

    let crop = pixels
        .crop_imm(src_x, src_y, src_x_end - src_x, src_y_end - src_y)
        .to_rgb8();

    if px_scale >= 1.0 {
        // Enlarging: map each covered output pixel centre back into the crop
        let crop_left = left + src_x as f64 * px_scale;
        let crop_top = top + src_y as f64 * px_scale;
        let (crop_w, crop_h) = crop.dimensions();

        for y in (y0.floor() as u32)..(y1.ceil() as u32).min(output_h) {
            let sy = ((y as f64 + 0.5 - crop_top) / px_scale).floor();
            if sy < 0.0 || sy >= crop_h as f64 {
                continue;
            }
            for x in (x0.floor() as u32)..(x1.ceil() as u32).min(output_w) {
                let sx = ((x as f64 + 0.5 - crop_left) / px_scale).floor();
                if sx < 0.0 || sx >= crop_w as f64 {
                    continue;
                }
                canvas.put_pixel(x, y, *crop.get_pixel(sx as u32, sy as u32));
            }
        }
        return canvas;
    }

    // Shrinking: resample the crop to its exact drawn size; the part that
    // overhangs the canvas edge is clipped by `overlay`.
    let dest_x = (left + src_x as f64 * px_scale).round() as i64;
    let dest_y = (top + src_y as f64 * px_scale).round() as i64;
    let dest_w = ((left + src_x_end as f64 * px_scale).round() as i64 - dest_x).max(1) as u32;
    let dest_h = ((top + src_y_end as f64 * px_scale).round() as i64 - dest_y).max(1) as u32;

    let resized = imageops::resize(&crop, dest_w, dest_h, FilterType::Triangle);
    imageops::overlay(&mut canvas, &resized, dest_x, dest_y);

    canvas
}
