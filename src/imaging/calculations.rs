//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or pixels. The
//! orientation rules and every threshold below are empirical values that the
//! output sizes depend on, so they are kept as literal constants.

use std::fmt;

/// Aspect-ratio band (width / height, inclusive) treated as square.
pub const SQUARE_BAND: (f64, f64) = (0.98, 1.02);

/// Portrait crop aspect as (width, height).
pub const PORTRAIT_ASPECT: (u32, u32) = (4, 5);

/// Bounding box for portrait output after the 4:5 crop.
pub const PORTRAIT_BOUNDS: (u32, u32) = (1080, 1350);

/// Maximum long edge for landscape output.
pub const LANDSCAPE_LONG_EDGE: u32 = 1350;

/// Bounding box for square output.
pub const SQUARE_BOUNDS: (u32, u32) = (1080, 1080);

/// Orientation class of an image, decided once from its decoded dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Square => "square",
        };
        f.write_str(name)
    }
}

/// Classify an image as portrait, landscape or square.
///
/// A width/height ratio within [`SQUARE_BAND`] is square; otherwise the
/// longer edge decides.
///
/// # Examples
/// ```
/// # use insta_prep::imaging::calculations::{classify_orientation, Orientation};
/// assert_eq!(classify_orientation((1000, 990)), Orientation::Square);
/// assert_eq!(classify_orientation((3000, 4000)), Orientation::Portrait);
/// assert_eq!(classify_orientation((4000, 3000)), Orientation::Landscape);
/// ```
pub fn classify_orientation(dims: (u32, u32)) -> Orientation {
    let (width, height) = dims;
    let ratio = width as f64 / height as f64;

    if (SQUARE_BAND.0..=SQUARE_BAND.1).contains(&ratio) {
        Orientation::Square
    } else if height > width {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    }
}

/// A rectangular region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate a centered crop to the given aspect ratio.
///
/// Uses integer arithmetic throughout: the kept edge is rounded down and the
/// margin is the integer half of what is removed. Returns `None` when the
/// source already has exactly the target ratio.
///
/// # Arguments
/// * `source` - Image dimensions (width, height)
/// * `aspect` - Target aspect ratio as (width, height)
pub fn calculate_center_crop(source: (u32, u32), aspect: (u32, u32)) -> Option<CropRect> {
    let (src_w, src_h) = source;
    let (aspect_w, aspect_h) = aspect;
    let (w, h) = (src_w as u64, src_h as u64);
    let (aw, ah) = (aspect_w as u64, aspect_h as u64);

    let rect = if w * ah > h * aw {
        // Too wide: keep full height, crop width
        let new_w = (h * aw / ah) as u32;
        CropRect {
            x: (src_w - new_w) / 2,
            y: 0,
            width: new_w,
            height: src_h,
        }
    } else {
        // Too tall (or exact): keep full width, crop height
        let new_h = (w * ah / aw) as u32;
        CropRect {
            x: 0,
            y: (src_h - new_h) / 2,
            width: src_w,
            height: new_h,
        }
    };

    if rect.width == src_w && rect.height == src_h {
        None
    } else {
        Some(rect)
    }
}

/// Fit dimensions inside a bounding box, preserving aspect ratio.
///
/// Never enlarges: if the source already fits, it is returned unchanged.
/// Edges are rounded to nearest and never drop below 1px.
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Limit the longer edge to `max_long_edge`, scaling the other proportionally.
///
/// Pure downscale: sources already within the limit are returned unchanged.
pub fn limit_long_edge(source: (u32, u32), max_long_edge: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w.max(src_h) <= max_long_edge {
        return source;
    }

    if src_w >= src_h {
        let h = (src_h as f64 * max_long_edge as f64 / src_w as f64).round() as u32;
        (max_long_edge, h.max(1))
    } else {
        let w = (src_w as f64 * max_long_edge as f64 / src_h as f64).round() as u32;
        (w.max(1), max_long_edge)
    }
}

/// How geometry should be normalized before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryMode {
    /// Crop/resize according to the image's orientation class.
    #[default]
    OrientationAdaptive,
    /// Keep the decoded geometry; the size-constrained encoder scales later.
    PreserveAspect,
}

/// A planned geometry transform: optional crop, then optional resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryPlan {
    pub crop: Option<CropRect>,
    /// Final dimensions after resizing, if a resize is needed.
    pub resize: Option<(u32, u32)>,
}

impl GeometryPlan {
    /// Dimensions the plan produces from `source`.
    pub fn output_dimensions(&self, source: (u32, u32)) -> (u32, u32) {
        self.resize
            .or(self.crop.map(|c| (c.width, c.height)))
            .unwrap_or(source)
    }
}

/// Plan the crop/resize for an image of the given dimensions.
///
/// `orientation` must be the class computed on the *uncropped* source; it is
/// never recomputed from the cropped dimensions.
pub fn plan_geometry(
    source: (u32, u32),
    orientation: Orientation,
    mode: GeometryMode,
) -> GeometryPlan {
    if mode == GeometryMode::PreserveAspect {
        return GeometryPlan {
            crop: None,
            resize: None,
        };
    }

    let (crop, cropped) = match orientation {
        Orientation::Portrait => {
            let crop = calculate_center_crop(source, PORTRAIT_ASPECT);
            let dims = crop.map(|c| (c.width, c.height)).unwrap_or(source);
            (crop, dims)
        }
        Orientation::Landscape | Orientation::Square => (None, source),
    };

    let target = match orientation {
        Orientation::Portrait => fit_within(cropped, PORTRAIT_BOUNDS),
        Orientation::Landscape => limit_long_edge(cropped, LANDSCAPE_LONG_EDGE),
        Orientation::Square => fit_within(cropped, SQUARE_BOUNDS),
    };

    GeometryPlan {
        crop,
        resize: (target != cropped).then_some(target),
    }
}

/// Linear shrink factor expected to bring an encoding of `size` bytes under
/// `ceiling`, including a 2% safety margin.
///
/// Encoded size scales roughly with pixel count, so the per-edge factor is
/// the square root of the byte ratio.
pub fn shrink_factor(ceiling: u64, size: u64) -> f64 {
    (ceiling as f64 / size as f64).sqrt() * 0.98
}

/// Scale both edges by `factor`, rounding down, with a per-edge minimum.
///
/// The minimum never enlarges an edge that was already below it.
pub fn scale_dimensions(source: (u32, u32), factor: f64, min_edge: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = ((src_w as f64 * factor).floor() as u32).max(min_edge.min(src_w));
    let h = ((src_h as f64 * factor).floor() as u32).max(min_edge.min(src_h));
    (w, h)
}
