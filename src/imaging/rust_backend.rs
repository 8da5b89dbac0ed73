//! Pure Rust decoding plus mozjpeg encoding.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | EXIF orientation | `Orientation::from_exif_chunk` + `DynamicImage::apply_orientation` |
//! | ICC profile / raw EXIF | `ImageDecoder::icc_profile` / `ImageDecoder::exif_metadata` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `mozjpeg` (progressive scans, optimized Huffman tables) |
//! | EXIF injection | `img-parts` APP1 segment |

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::params::EncodeParams;
use image::imageops::FilterType;
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use mozjpeg::{ColorSpace, Compress};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::LazyLock;
use tracing::debug;

/// Input extensions paired with the decoder that handles them.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Production backend: `image` decoders and resampler, mozjpeg encoder.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(e: image::ImageError) -> BackendError {
    BackendError::Decode(e.to_string())
}

/// Encode RGB pixels as JPEG with mozjpeg.
fn encode_jpeg(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let rgb: Cow<'_, RgbImage> = match image {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        _ => Cow::Owned(image.to_rgb8()),
    };
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(BackendError::Encode(format!(
            "invalid image dimensions {width}x{height}"
        )));
    }

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(params.quality.value() as f32);
    if params.progressive {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(params.optimize);
    comp.set_optimize_scans(params.progressive && params.optimize);

    let mut output = Vec::with_capacity((width as usize * height as usize / 4).max(4096));
    {
        let mut writer = comp
            .start_compress(&mut output)
            .map_err(|e| BackendError::Encode(format!("mozjpeg start: {e}")))?;
        writer
            .write_scanlines(rgb.as_raw())
            .map_err(|e| BackendError::Encode(format!("mozjpeg scanlines: {e}")))?;
        writer
            .finish()
            .map_err(|e| BackendError::Encode(format!("mozjpeg finish: {e}")))?;
    }

    match params.exif {
        Some(exif) => embed_exif(output, exif),
        None => Ok(output),
    }
}

/// Insert a TIFF-structured EXIF block as the JPEG's APP1 segment.
fn embed_exif(jpeg_data: Vec<u8>, exif: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(jpeg_data))
        .map_err(|e| BackendError::Encode(format!("failed to parse encoded JPEG: {e}")))?;
    jpeg.set_exif(Some(Bytes::copy_from_slice(exif)));

    let mut output = Vec::new();
    jpeg.encoder().write_to(&mut output)?;
    Ok(output)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_decoder()
            .map_err(decode_error)?;

        // Embedded profile and EXIF are optional extras; a decoder that
        // cannot read them still yields usable pixels.
        let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
            debug!(error = %e, "unreadable ICC profile");
            None
        });
        let exif = decoder.exif_metadata().unwrap_or_else(|e| {
            debug!(error = %e, "unreadable EXIF block");
            None
        });
        let orientation = match exif.as_deref() {
            Some(chunk) => ExifOrientation::from_exif_chunk(chunk),
            None => decoder.orientation().ok(),
        }
        .unwrap_or(ExifOrientation::NoTransforms);

        let mut pixels = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        pixels.apply_orientation(orientation);

        Ok(SourceImage {
            pixels,
            icc_profile,
            exif,
        })
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        encode_jpeg(image, params)
    }
}
