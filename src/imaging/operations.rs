//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take a
//! decoded image, compute the transform, and call the backend for pixel work.

use super::backend::{Dimensions, ImageBackend};
use super::calculations::{GeometryMode, GeometryPlan, Orientation, classify_orientation, plan_geometry};
use super::params::Sharpening;
use image::{DynamicImage, RgbImage, imageops};
use tracing::debug;

/// Geometry-normalized image together with the class that drove it.
#[derive(Debug, Clone)]
pub struct NormalizedGeometry {
    pub orientation: Orientation,
    pub image: DynamicImage,
}

/// Apply a planned crop/resize through the backend.
pub fn apply_geometry(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    plan: &GeometryPlan,
) -> DynamicImage {
    let cropped = match plan.crop {
        Some(rect) => image.crop_imm(rect.x, rect.y, rect.width, rect.height),
        None => image.clone(),
    };
    match plan.resize {
        Some((width, height)) => backend.resize(&cropped, width, height),
        None => cropped,
    }
}

/// Classify the image once and crop/resize it for its orientation.
///
/// The returned orientation is the classification of the *input*; the
/// cropped result is never reclassified.
pub fn normalize_geometry(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    mode: GeometryMode,
) -> NormalizedGeometry {
    let dims = Dimensions::of(image).as_tuple();
    let orientation = classify_orientation(dims);
    let plan = plan_geometry(dims, orientation, mode);
    debug!(
        %orientation,
        from = ?dims,
        to = ?plan.output_dimensions(dims),
        "geometry"
    );

    NormalizedGeometry {
        orientation,
        image: apply_geometry(backend, image, &plan),
    }
}

/// Unsharp mask: add `amount`% of the high-pass difference back to each
/// channel whose difference reaches `threshold`.
pub fn sharpen(image: &RgbImage, params: Sharpening) -> RgbImage {
    let blurred = imageops::blur(image, params.radius);
    let amount = params.amount as i32;
    let threshold = params.threshold as i32;

    let mut out = image.clone();
    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (channel, &blur) in px.0.iter_mut().zip(soft.0.iter()) {
            let orig = *channel as i32;
            let diff = orig - blur as i32;
            if diff.abs() >= threshold {
                *channel = (orig + diff * amount / 100).clamp(0, 255) as u8;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::calculations::CropRect;
    use crate::test_helpers::gradient_image;
    use image::Rgb;

    #[test]
    fn portrait_is_cropped_then_resized() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(3000, 4000);

        let result = normalize_geometry(&backend, &img, GeometryMode::OrientationAdaptive);

        assert_eq!(result.orientation, Orientation::Portrait);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resize {
                width: 1080,
                height: 1350
            }]
        );
        assert_eq!(Dimensions::of(&result.image).as_tuple(), (1080, 1350));
    }

    #[test]
    fn small_landscape_is_untouched() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(1200, 800);

        let result = normalize_geometry(&backend, &img, GeometryMode::OrientationAdaptive);

        assert_eq!(result.orientation, Orientation::Landscape);
        assert!(backend.get_operations().is_empty());
        assert_eq!(Dimensions::of(&result.image).as_tuple(), (1200, 800));
    }

    #[test]
    fn preserve_aspect_still_classifies() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(1000, 1000);

        let result = normalize_geometry(&backend, &img, GeometryMode::PreserveAspect);

        assert_eq!(result.orientation, Orientation::Square);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn crop_without_resize_skips_backend() {
        let backend = MockBackend::new();
        let img = DynamicImage::ImageRgb8(gradient_image(500, 700));
        let plan = GeometryPlan {
            crop: Some(CropRect {
                x: 0,
                y: 37,
                width: 500,
                height: 625,
            }),
            resize: None,
        };

        let out = apply_geometry(&backend, &img, &plan);

        assert_eq!(Dimensions::of(&out).as_tuple(), (500, 625));
        assert!(backend.get_operations().is_empty());
        // Row 0 of the crop is row 37 of the source
        assert_eq!(out.to_rgb8().get_pixel(3, 0), &Rgb([3, 37, 128]));
    }

    #[test]
    fn sharpen_leaves_flat_image_alone() {
        let img = RgbImage::from_pixel(16, 16, Rgb([90, 120, 200]));
        assert_eq!(sharpen(&img, Sharpening::screen()), img);
    }

    #[test]
    fn sharpen_increases_edge_contrast() {
        let img = RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 { Rgb([60; 3]) } else { Rgb([180; 3]) }
        });
        let out = sharpen(&img, Sharpening::screen());

        assert!(out.get_pixel(7, 8).0[0] < 60);
        assert!(out.get_pixel(8, 8).0[0] > 180);
        // Far from the edge nothing changes
        assert_eq!(out.get_pixel(0, 8), img.get_pixel(0, 8));
    }

    #[test]
    fn sharpen_respects_threshold() {
        let img = RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 { Rgb([100; 3]) } else { Rgb([101; 3]) }
        });
        let params = Sharpening {
            threshold: 10,
            ..Sharpening::screen()
        };
        assert_eq!(sharpen(&img, params), img);
    }
}
