//! Size-constrained JPEG encoding.
//!
//! Produces the highest-quality encoding that fits a byte ceiling. One entry
//! point, [`encode_within_limit`], serves both operating modes so they cannot
//! drift apart:
//!
//! ## Fixed geometry ([`EncodeMode::FixedGeometry`])
//!
//! The image has already been sized for the platform. Starting at the
//! requested quality, step down by 5 until the encoding fits; the floor (60)
//! is always the last step tried. If even the floor is too large, its
//! encoding is returned anyway, flagged as over the ceiling.
//!
//! ## Free geometry ([`EncodeMode::FreeGeometry`])
//!
//! The caller gave a byte budget instead of target dimensions.
//!
//! ```text
//! Phase 1  encode at q95; while too large (max 5 rounds):
//!          factor = sqrt(C / size) * 0.98, stop if factor >= 0.99,
//!          shrink both edges (min 100px) and re-encode at q95
//! Phase 2  binary search q in [60, 100] at that resolution,
//!          keeping the best quality that fits
//! Fallback nothing fits → shrink ×0.8, encode once at q80, accept it
//! ```
//!
//! Both modes attach the metadata blob to every attempt, so its bytes count
//! toward every size measurement rather than being added after the search.
//!
//! The ceiling is a target, not an invariant: exceeding it is reported through
//! [`EncodedImage::within_limit`], never as an error. Only codec failures
//! propagate.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{scale_dimensions, shrink_factor};
use super::params::{EncodeParams, Quality};
use image::DynamicImage;
use tracing::debug;

/// Quality decrement between fixed-geometry attempts.
pub const QUALITY_STEP: u32 = 5;
/// Quality used while searching for a resolution in free-geometry mode.
pub const PROBE_QUALITY: Quality = Quality(95);
/// Maximum number of downscale rounds in free-geometry mode.
pub const MAX_SCALE_ROUNDS: u32 = 5;
/// Shrink factors at or above this are not worth another round.
pub const SCALE_CONVERGED: f64 = 0.99;
/// Neither edge is shrunk below this many pixels while scaling.
pub const MIN_SCALED_EDGE: u32 = 100;
/// Last-resort shrink when no quality fits.
pub const FALLBACK_SCALE: f64 = 0.8;
/// Quality of the last-resort encode.
pub const FALLBACK_QUALITY: Quality = Quality(80);

/// Which search the encoder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    /// Geometry is final; only quality is searched, stepping down from
    /// `start_quality`.
    FixedGeometry { start_quality: Quality },
    /// Geometry is free; scale first, then binary-search quality.
    FreeGeometry,
}

/// Ceiling and mode for one encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Maximum output size in bytes.
    pub ceiling: u64,
    pub mode: EncodeMode,
}

/// The chosen encoding and how it was reached.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    pub quality: Quality,
    /// False when the floor settings (or the fallback) still exceed the ceiling.
    pub within_limit: bool,
    /// Downscale rounds applied on top of the input geometry.
    pub scale_steps: u32,
}

impl EncodedImage {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Working state for one image's search. Never outlives the call.
struct EncodingPlan<'a, B: ImageBackend> {
    backend: &'a B,
    /// Geometry-normalized input; every resample starts from here.
    original: &'a DynamicImage,
    /// Buffer currently being encoded (original or a downscaled copy).
    current: DynamicImage,
    exif: Option<&'a [u8]>,
    ceiling: u64,
    scale_steps: u32,
    /// Best fitting (quality, bytes) seen by the quality search.
    best: Option<(Quality, Vec<u8>)>,
}

impl<'a, B: ImageBackend> EncodingPlan<'a, B> {
    fn new(
        backend: &'a B,
        original: &'a DynamicImage,
        exif: Option<&'a [u8]>,
        ceiling: u64,
    ) -> Self {
        Self {
            backend,
            original,
            current: original.clone(),
            exif,
            ceiling,
            scale_steps: 0,
            best: None,
        }
    }

    fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.current)
    }

    fn fits(&self, bytes: &[u8]) -> bool {
        bytes.len() as u64 <= self.ceiling
    }

    fn attempt(&self, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let bytes = self
            .backend
            .encode(&self.current, &EncodeParams::web(quality, self.exif))?;
        let dims = self.dimensions();
        debug!(
            width = dims.width,
            height = dims.height,
            %quality,
            size = bytes.len(),
            ceiling = self.ceiling,
            "encode attempt"
        );
        Ok(bytes)
    }

    fn rescale(&mut self, width: u32, height: u32) {
        self.current = self.backend.resize(self.original, width, height);
    }

    fn finish(self, bytes: Vec<u8>, quality: Quality, within_limit: bool) -> EncodedImage {
        EncodedImage {
            dimensions: Dimensions::of(&self.current),
            bytes,
            quality,
            within_limit,
            scale_steps: self.scale_steps,
        }
    }

    /// Step quality down from `start` until an encoding fits.
    fn step_down(self, start: Quality) -> Result<EncodedImage, BackendError> {
        let mut quality = start.max(Quality::FLOOR);
        loop {
            let bytes = self.attempt(quality)?;
            if self.fits(&bytes) {
                return Ok(self.finish(bytes, quality, true));
            }
            if quality <= Quality::FLOOR {
                return Ok(self.finish(bytes, quality, false));
            }
            quality = Quality(quality.value().saturating_sub(QUALITY_STEP)).max(Quality::FLOOR);
        }
    }

    /// Phase 1: shrink until a probe encoding fits or scaling stops paying off.
    fn scale_to_budget(&mut self) -> Result<(), BackendError> {
        let mut size = self.attempt(PROBE_QUALITY)?.len() as u64;

        for _ in 0..MAX_SCALE_ROUNDS {
            if size <= self.ceiling {
                break;
            }
            let factor = shrink_factor(self.ceiling, size);
            if factor >= SCALE_CONVERGED {
                break;
            }
            let current = self.dimensions().as_tuple();
            let (width, height) = scale_dimensions(current, factor, MIN_SCALED_EDGE);
            if (width, height) == current {
                break;
            }
            self.rescale(width, height);
            self.scale_steps += 1;
            size = self.attempt(PROBE_QUALITY)?.len() as u64;
        }
        Ok(())
    }

    /// Phase 2: binary search for the highest fitting quality.
    fn search_quality(&mut self) -> Result<(), BackendError> {
        let (mut lo, mut hi) = (Quality::FLOOR.value(), Quality::MAX.value());
        while lo <= hi {
            let mid = Quality((lo + hi) / 2);
            let bytes = self.attempt(mid)?;
            if self.fits(&bytes) {
                self.best = Some((mid, bytes));
                lo = mid.value() + 1;
            } else {
                hi = mid.value() - 1;
            }
        }
        Ok(())
    }

    fn scale_then_search(mut self) -> Result<EncodedImage, BackendError> {
        self.scale_to_budget()?;
        self.search_quality()?;

        if let Some((quality, bytes)) = self.best.take() {
            return Ok(self.finish(bytes, quality, true));
        }

        let current = self.dimensions().as_tuple();
        let (width, height) = scale_dimensions(current, FALLBACK_SCALE, 1);
        debug!(width, height, "no quality fits, using fallback scale");
        self.rescale(width, height);
        self.scale_steps += 1;
        let bytes = self.attempt(FALLBACK_QUALITY)?;
        let within_limit = self.fits(&bytes);
        Ok(self.finish(bytes, FALLBACK_QUALITY, within_limit))
    }
}

/// Encode `image` as progressive JPEG, keeping it at or under
/// `config.ceiling` bytes where the mode's search allows.
///
/// `exif` is embedded in every attempt, including the one returned.
pub fn encode_within_limit(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    exif: Option<&[u8]>,
    config: &EncodeConfig,
) -> Result<EncodedImage, BackendError> {
    let plan = EncodingPlan::new(backend, image, exif, config.ceiling);
    match config.mode {
        EncodeMode::FixedGeometry { start_quality } => plan.step_down(start_quality),
        EncodeMode::FreeGeometry => plan.scale_then_search(),
    }
}
