//! Image processing: decode, normalize, encode under a byte ceiling.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` decoders, EXIF orientation applied on load |
//! | **Color** | `lcms2` ICC transform to sRGB |
//! | **Geometry** | 4:5 center crop + Lanczos3 resize |
//! | **Sharpen** | Gaussian-blur unsharp mask |
//! | **Encode** | `mozjpeg` progressive JPEG, size-constrained quality search |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for orientation and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Geometry normalization and sharpening
//! - **Encoder**: The size-constrained JPEG search

pub mod backend;
pub mod calculations;
pub mod color;
pub mod encoder;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceImage};
pub use calculations::{GeometryMode, Orientation};
pub use encoder::{EncodeConfig, EncodeMode, EncodedImage, encode_within_limit};
pub use operations::{NormalizedGeometry, normalize_geometry, sharpen};
pub use params::{EncodeParams, Quality, Sharpening};
pub use rust_backend::RustBackend;
