//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, resize, and encode. Everything above it (geometry, the
//! size-constrained search, batch orchestration) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` for decoding
//! and resampling, mozjpeg for progressive JPEG output.

use super::params::EncodeParams;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A decoded input image and the metadata carried alongside its pixels.
///
/// `pixels` has already been rotated/flipped according to the EXIF
/// Orientation tag, so its dimensions are the ones a viewer would display.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    /// Embedded ICC color profile, if any.
    pub icc_profile: Option<Vec<u8>>,
    /// Raw TIFF-structured EXIF block, if any.
    pub exif: Option<Vec<u8>>,
}

impl SourceImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.pixels)
    }
}

/// Trait for image codec backends.
///
/// Every backend must implement all three operations so the rest of the
/// codebase never touches a codec directly.
pub trait ImageBackend {
    /// Decode file bytes into pixels plus embedded profile and EXIF.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode to JPEG bytes.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Encoded byte count as a function of (width, height, quality).
    pub type SizeModel = fn(u32, u32, u32) -> usize;

    /// Mock backend that records operations and fakes encoded sizes.
    ///
    /// Encodes return a zero-filled buffer whose length comes from the size
    /// model plus the attached EXIF length, so search logic can be tested
    /// against exact, monotonic sizes.
    pub struct MockBackend {
        pub size_model: SizeModel,
        pub decode_results: Mutex<Vec<SourceImage>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode,
        Resize {
            width: u32,
            height: u32,
        },
        Encode {
            width: u32,
            height: u32,
            quality: u32,
            progressive: bool,
            exif_len: usize,
        },
    }

    /// One byte per 8 pixels at quality 100, linear in quality.
    fn default_size_model(width: u32, height: u32, quality: u32) -> usize {
        (width as usize * height as usize * quality as usize) / 800
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::with_size_model(default_size_model)
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_size_model(size_model: SizeModel) -> Self {
            Self {
                size_model,
                decode_results: Mutex::new(Vec::new()),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn with_decoded(images: Vec<SourceImage>) -> Self {
            let backend = Self::default();
            *backend.decode_results.lock().unwrap() = images;
            backend
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Qualities of every encode attempt, in order.
        pub fn encoded_qualities(&self) -> Vec<u32> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality, .. } => Some(quality),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, _bytes: &[u8]) -> Result<SourceImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode);
            self.decode_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock image".to_string()))
        }

        fn resize(&self, _image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Resize { width, height });
            DynamicImage::new_rgb8(width, height)
        }

        fn encode(
            &self,
            image: &DynamicImage,
            params: &EncodeParams,
        ) -> Result<Vec<u8>, BackendError> {
            let exif_len = params.exif.map_or(0, <[u8]>::len);
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: image.width(),
                height: image.height(),
                quality: params.quality.value(),
                progressive: params.progressive,
                exif_len,
            });
            let size = (self.size_model)(image.width(), image.height(), params.quality.value());
            Ok(vec![0; size + exif_len])
        }
    }

    #[test]
    fn mock_encode_size_follows_model() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(80, 10);
        let params = EncodeParams::web(crate::imaging::Quality::new(100), None);

        let bytes = backend.encode(&img, &params).unwrap();
        assert_eq!(bytes.len(), 100);
    }

    #[test]
    fn mock_encode_counts_exif_bytes() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(80, 10);
        let exif = [0u8; 25];
        let params = EncodeParams::web(crate::imaging::Quality::new(100), Some(&exif));

        let bytes = backend.encode(&img, &params).unwrap();
        assert_eq!(bytes.len(), 125);
        assert!(matches!(
            backend.get_operations()[0],
            RecordedOp::Encode {
                exif_len: 25,
                progressive: true,
                ..
            }
        ));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(40, 30);

        let resized = backend.resize(&img, 20, 15);
        assert_eq!(Dimensions::of(&resized), Dimensions { width: 20, height: 15 });
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resize {
                width: 20,
                height: 15
            }]
        );
    }

    #[test]
    fn mock_decode_without_results_errors() {
        let backend = MockBackend::new();
        assert!(matches!(backend.decode(b""), Err(BackendError::Decode(_))));
    }
}
