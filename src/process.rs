//! Batch orchestration.
//!
//! Runs every discovered image through the pipeline, one at a time:
//!
//! ```text
//! read → decode (+EXIF orientation) → classify → crop/resize
//!      → sRGB → sharpen? → EXIF allow-list? → size-constrained encode → write
//! ```
//!
//! Each image is an independent unit of work returning
//! `Result<ProcessingResult, ProcessError>`. A failure is recorded in the
//! [`BatchReport`] and the batch moves on; only failing to create the output
//! directory aborts the run.
//!
//! ## Output Structure
//!
//! ```text
//! INSTA/
//! ├── beach.jpg     # from beach.png
//! ├── dawn.jpg      # from dawn.tif
//! └── portrait.jpg  # from portrait.jpeg
//! ```
//!
//! ## Progress
//!
//! Callers may pass a [`Sender<ProcessEvent>`]; the CLI drains it on a printer
//! thread while images are processed here sequentially.

use crate::config::PrepConfig;
use crate::imaging::color::normalize_color;
use crate::imaging::{
    BackendError, Dimensions, EncodeConfig, EncodeMode, GeometryMode, ImageBackend, Orientation,
    Quality, Sharpening, encode_within_limit, normalize_geometry, sharpen,
};
use crate::metadata;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Cannot derive an output name from {0}")]
    InvalidName(PathBuf),
}

/// Per-run processing options, resolved from config and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Starting quality for the fixed-geometry search.
    pub start_quality: Quality,
    /// Byte ceiling per output file.
    pub max_file_size: u64,
    /// Preserve aspect and let the encoder scale to the byte budget.
    pub fit_size: bool,
    /// Unsharp mask to apply, or `None` to skip sharpening.
    pub sharpening: Option<Sharpening>,
    /// Keep the GPS + timestamp allow-list.
    pub keep_metadata: bool,
}

impl ProcessOptions {
    pub fn from_config(config: &PrepConfig) -> Self {
        Self {
            start_quality: Quality::new(config.output.quality),
            max_file_size: config.output.max_file_size,
            fit_size: config.output.fit_size,
            sharpening: config.sharpening.params(),
            keep_metadata: config.metadata.keep,
        }
    }

    pub fn geometry_mode(&self) -> GeometryMode {
        if self.fit_size {
            GeometryMode::PreserveAspect
        } else {
            GeometryMode::OrientationAdaptive
        }
    }

    pub fn encode_config(&self) -> EncodeConfig {
        let mode = if self.fit_size {
            EncodeMode::FreeGeometry
        } else {
            EncodeMode::FixedGeometry {
                start_quality: self.start_quality,
            }
        };
        EncodeConfig {
            ceiling: self.max_file_size,
            mode,
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from_config(&PrepConfig::default())
    }
}

/// Outcome of one successfully written image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub source: PathBuf,
    pub output: PathBuf,
    pub orientation: Orientation,
    /// Decoded dimensions, after EXIF orientation.
    pub original: Dimensions,
    pub dimensions: Dimensions,
    pub quality: Quality,
    pub file_size: u64,
    /// False when the file was written over the ceiling.
    pub within_limit: bool,
}

/// An image that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub source: PathBuf,
    pub message: String,
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub results: Vec<ProcessingResult>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// Successfully written images that still exceed the ceiling.
    pub fn over_limit(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| !r.within_limit)
    }
}

/// Progress events streamed while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Started {
        index: usize,
        total: usize,
        source: PathBuf,
    },
    Processed {
        index: usize,
        total: usize,
        result: ProcessingResult,
    },
    Failed {
        index: usize,
        total: usize,
        source: PathBuf,
        message: String,
    },
}

/// `<output_dir>/<stem>.jpg` for `source`.
pub fn output_path_for(source: &Path, output_dir: &Path) -> Option<PathBuf> {
    let stem = source.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".jpg");
    Some(output_dir.join(name))
}

/// Serialize the allow-listed EXIF, or `None` when stripping or nothing survives.
fn metadata_blob(raw: Option<&[u8]>, keep: bool) -> Option<Vec<u8>> {
    if !keep {
        return None;
    }
    let trimmed = metadata::filter_or_empty(raw);
    trimmed.to_exif_bytes().unwrap_or_else(|e| {
        warn!(error = %e, "dropping metadata that could not be re-encoded");
        None
    })
}

/// Process one image from `source` into `output`.
pub fn process_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessingResult, ProcessError> {
    let bytes = fs::read(source)?;
    let decoded = backend.decode(&bytes)?;
    let original = decoded.dimensions();

    let geometry = normalize_geometry(backend, &decoded.pixels, options.geometry_mode());
    let mut rgb = normalize_color(&geometry.image, decoded.icc_profile.as_deref());
    if let Some(params) = options.sharpening {
        rgb = sharpen(&rgb, params);
    }

    let exif = metadata_blob(decoded.exif.as_deref(), options.keep_metadata);
    let encoded = encode_within_limit(
        backend,
        &DynamicImage::ImageRgb8(rgb),
        exif.as_deref(),
        &options.encode_config(),
    )?;

    if !encoded.within_limit {
        warn!(
            source = %source.display(),
            size = encoded.size(),
            ceiling = options.max_file_size,
            "could not meet size ceiling, writing anyway"
        );
    }
    fs::write(output, &encoded.bytes)?;
    debug!(
        output = %output.display(),
        quality = %encoded.quality,
        scale_steps = encoded.scale_steps,
        "written"
    );

    Ok(ProcessingResult {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        orientation: geometry.orientation,
        original,
        dimensions: encoded.dimensions,
        quality: encoded.quality,
        file_size: encoded.size(),
        within_limit: encoded.within_limit,
    })
}

/// Process `images` in order, isolating per-image failures.
///
/// Creates `output_dir` if needed; that is the only error that aborts the
/// whole batch.
pub fn process_batch(
    backend: &impl ImageBackend,
    images: &[PathBuf],
    output_dir: &Path,
    options: &ProcessOptions,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    fs::create_dir_all(output_dir)?;
    let total = images.len();
    let emit = |event: ProcessEvent| {
        if let Some(tx) = &progress {
            // Receiver gone means nobody is listening; keep processing.
            tx.send(event).ok();
        }
    };

    let mut report = BatchReport {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };

    for (i, source) in images.iter().enumerate() {
        let index = i + 1;
        emit(ProcessEvent::Started {
            index,
            total,
            source: source.clone(),
        });

        let outcome = output_path_for(source, output_dir)
            .ok_or_else(|| ProcessError::InvalidName(source.clone()))
            .and_then(|output| process_image(backend, source, &output, options));

        match outcome {
            Ok(result) => {
                emit(ProcessEvent::Processed {
                    index,
                    total,
                    result: result.clone(),
                });
                report.results.push(result);
            }
            Err(e) => {
                let message = e.to_string();
                warn!(source = %source.display(), error = %message, "image failed");
                emit(ProcessEvent::Failed {
                    index,
                    total,
                    source: source.clone(),
                    message: message.clone(),
                });
                report.failures.push(BatchFailure {
                    source: source.clone(),
                    message,
                });
            }
        }
    }

    info!(
        succeeded = report.success_count(),
        failed = report.error_count(),
        "batch complete"
    );
    Ok(report)
}
