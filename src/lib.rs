//! # insta-prep
//!
//! Batch-prepare photographs for Instagram. Every input comes out as a
//! progressive sRGB JPEG, sized for its orientation and kept under the
//! platform's upload limit.
//!
//! # Pipeline
//!
//! ```text
//! discover   INPUT (file | dir | glob)  →  sorted image list
//! per image  decode → classify → crop/resize → sRGB → sharpen
//!            → EXIF allow-list → size-constrained encode → <stem>.jpg
//! report     per-image results + isolated failures
//! ```
//!
//! Images are processed sequentially; a failing image is reported and the
//! batch continues.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Resolves INPUT to image paths and the default `INSTA/` output dir |
//! | [`process`] | Runs the per-image pipeline and aggregates a [`process::BatchReport`] |
//! | [`imaging`] | Decode, geometry, color, sharpening, and the size-constrained encoder |
//! | [`metadata`] | EXIF allow-list: GPS + timestamps, nothing else |
//! | [`config`] | TOML config loading, merging, validation; human size parsing |
//! | [`output`] | CLI output formatting for progress, dry runs, and the summary |
//!
//! # Design Decisions
//!
//! ## Orientation-Driven Geometry
//!
//! | Class | Rule | Output |
//! |---|---|---|
//! | Portrait | center-crop to 4:5, fit | ≤ 1080×1350 |
//! | Landscape | limit long edge | ≤ 1350 long edge |
//! | Square (ratio 0.98–1.02) | fit | ≤ 1080×1080 |
//!
//! Nothing is ever upscaled. The class is decided once on the decoded image
//! and never recomputed after cropping, so a processed 1080×1350 portrait
//! passes through a second run unchanged.
//!
//! ## A Ceiling, Not a Guarantee
//!
//! The encoder treats the byte ceiling as a target. When even the lowest
//! acceptable settings overshoot, the file is written anyway and reported as
//! over the limit. A batch tool that silently drops a photo is worse than
//! one that produces an oversized one.
//!
//! ## Two Encoder Modes, One Entry Point
//!
//! Platform sizing (`FixedGeometry`) only searches quality; `--fit-size`
//! (`FreeGeometry`) keeps the aspect ratio and trades resolution for bytes
//! first. Both live behind [`imaging::encode_within_limit`] so their size
//! accounting cannot drift apart.
//!
//! ## Pure-Rust Decoding, mozjpeg Encoding
//!
//! Decoding and Lanczos3 resampling use the `image` crate. Output goes
//! through mozjpeg for progressive scans and optimized Huffman tables, which
//! the `image` JPEG encoder does not offer.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
