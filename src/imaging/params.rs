//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) and
//! [`encoder`](super::encoder) modules (which decide what to produce) and the
//! [`backend`](super::backend) (which does the actual pixel and codec work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing the search logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 100). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (radius, amount, threshold).
//! - [`EncodeParams`]: One encode attempt: quality, scan layout, metadata blob.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    /// Lowest quality the size search will ever go to.
    pub const FLOOR: Quality = Quality(60);
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unsharp mask parameters.
///
/// - `radius`: Gaussian blur sigma in pixels
/// - `amount`: strength in percent (100 = add the full high-pass difference)
/// - `threshold`: per-channel differences below this are left untouched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub radius: f32,
    pub amount: u32,
    pub threshold: u8,
}

impl Sharpening {
    /// Subtle sharpening for images viewed on phone screens.
    pub fn screen() -> Self {
        Self {
            radius: 0.8,
            amount: 50,
            threshold: 2,
        }
    }
}

impl Default for Sharpening {
    fn default() -> Self {
        Self::screen()
    }
}

/// Parameters for a single JPEG encode attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams<'a> {
    pub quality: Quality,
    pub progressive: bool,
    pub optimize: bool,
    /// Raw TIFF-structured EXIF to embed in an APP1 segment.
    pub exif: Option<&'a [u8]>,
}

impl<'a> EncodeParams<'a> {
    /// Progressive, optimized-coding encode at `quality` with optional EXIF.
    pub fn web(quality: Quality, exif: Option<&'a [u8]>) -> Self {
        Self {
            quality,
            progressive: true,
            optimize: true,
            exif,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(75).value(), 75);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_100() {
        assert_eq!(Quality::default().value(), 100);
    }

    #[test]
    fn quality_orders_numerically() {
        assert!(Quality::FLOOR < Quality::MAX);
        assert!(Quality::new(85) > Quality::new(80));
    }

    #[test]
    fn sharpening_screen_values() {
        let s = Sharpening::screen();
        assert_eq!(s.radius, 0.8);
        assert_eq!(s.amount, 50);
        assert_eq!(s.threshold, 2);
    }

    #[test]
    fn web_params_are_progressive_and_optimized() {
        let exif = [1u8, 2, 3];
        let params = EncodeParams::web(Quality::new(90), Some(&exif));
        assert!(params.progressive);
        assert!(params.optimize);
        assert_eq!(params.exif, Some(&exif[..]));
    }
}
