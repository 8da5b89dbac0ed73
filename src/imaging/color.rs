//! Color normalization to sRGB.
//!
//! Instagram assumes sRGB and ignores most embedded profiles, so pixels
//! tagged with anything else (Adobe RGB, Display P3, ProPhoto) are converted
//! with Little CMS before encoding. Conversion is best-effort:
//! [`convert_to_srgb`] reports failures as a [`ColorError`], and
//! [`normalize_color`] turns that into "keep the pixels as they are".

use image::{DynamicImage, RgbImage};
use lcms2::{InfoType, Intent, Locale, PixelFormat, Profile, Transform};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ColorError {
    #[error("ICC conversion failed: {0}")]
    Lcms(#[from] lcms2::Error),
}

/// Whether a parsed profile describes itself as sRGB.
pub fn is_srgb_profile(profile: &Profile) -> bool {
    profile
        .info(InfoType::Description, Locale::none())
        .is_some_and(|desc| desc.contains("sRGB"))
}

/// Convert pixels from the embedded profile `icc` to sRGB.
///
/// Returns `Ok(None)` when the profile already is sRGB and nothing needs to
/// change.
pub fn convert_to_srgb(image: &DynamicImage, icc: &[u8]) -> Result<Option<RgbImage>, ColorError> {
    let input = Profile::new_icc(icc)?;
    if is_srgb_profile(&input) {
        return Ok(None);
    }

    let output = Profile::new_srgb();
    let transform: Transform<[u8; 3], [u8; 3]> = Transform::new(
        &input,
        PixelFormat::RGB_8,
        &output,
        PixelFormat::RGB_8,
        Intent::Perceptual,
    )?;

    let mut rgb = image.to_rgb8();
    let mut pixels: Vec<[u8; 3]> = rgb.pixels().map(|p| p.0).collect();
    transform.transform_in_place(&mut pixels);
    for (dst, src) in rgb.pixels_mut().zip(pixels) {
        dst.0 = src;
    }
    Ok(Some(rgb))
}

/// Produce an 8-bit RGB buffer in sRGB, whatever the input layout.
///
/// Grayscale, alpha, 16-bit and palette inputs all come out as RGB8. If the
/// profile cannot be applied the unconverted pixels are used.
pub fn normalize_color(image: &DynamicImage, icc: Option<&[u8]>) -> RgbImage {
    let Some(icc) = icc else {
        return image.to_rgb8();
    };

    match convert_to_srgb(image, icc) {
        Ok(Some(converted)) => converted,
        Ok(None) => image.to_rgb8(),
        Err(e) => {
            warn!(error = %e, "keeping unconverted pixels");
            image.to_rgb8()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcms2::{CIExyY, CIExyYTRIPLE, ToneCurve};

    /// sRGB primaries and white point with a linear (gamma 1.0) transfer curve.
    fn linear_rgb_icc() -> Vec<u8> {
        let white = CIExyY {
            x: 0.3127,
            y: 0.3290,
            Y: 1.0,
        };
        let primaries = CIExyYTRIPLE {
            Red: CIExyY {
                x: 0.64,
                y: 0.33,
                Y: 1.0,
            },
            Green: CIExyY {
                x: 0.30,
                y: 0.60,
                Y: 1.0,
            },
            Blue: CIExyY {
                x: 0.15,
                y: 0.06,
                Y: 1.0,
            },
        };
        let curve = ToneCurve::new(1.0);
        Profile::new_rgb(&white, &primaries, &[&curve, &curve, &curve])
            .unwrap()
            .icc()
            .unwrap()
    }

    fn gray_rgb(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([value; 3])))
    }

    #[test]
    fn no_profile_passes_pixels_through() {
        let img = gray_rgb(100);
        assert_eq!(normalize_color(&img, None), img.to_rgb8());
    }

    #[test]
    fn grayscale_becomes_rgb() {
        let img = DynamicImage::new_luma8(8, 8);
        let rgb = normalize_color(&img, None);
        assert_eq!(rgb.dimensions(), (8, 8));
        assert_eq!(rgb.as_raw().len(), 8 * 8 * 3);
    }

    #[test]
    fn alpha_is_dropped() {
        let img = DynamicImage::new_rgba8(5, 5);
        assert_eq!(normalize_color(&img, None).as_raw().len(), 5 * 5 * 3);
    }

    #[test]
    fn srgb_profile_needs_no_conversion() {
        let icc = Profile::new_srgb().icc().unwrap();
        assert!(convert_to_srgb(&gray_rgb(100), &icc).unwrap().is_none());
    }

    #[test]
    fn malformed_profile_is_an_error() {
        assert!(convert_to_srgb(&gray_rgb(100), b"not an icc profile").is_err());
    }

    #[test]
    fn malformed_profile_falls_back_to_original() {
        let img = gray_rgb(100);
        assert_eq!(
            normalize_color(&img, Some(b"not an icc profile")),
            img.to_rgb8()
        );
    }

    #[test]
    fn linear_profile_is_converted() {
        // Linear 100/255 is about 0.39 intensity; sRGB-encoded that is ~170
        let converted = convert_to_srgb(&gray_rgb(100), &linear_rgb_icc())
            .unwrap()
            .expect("linear profile is not sRGB");
        let px = converted.get_pixel(0, 0).0;
        assert!(px[0] > 140, "expected brighter sRGB value, got {px:?}");
    }
}
