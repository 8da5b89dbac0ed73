//! Input discovery.
//!
//! Turns the user's INPUT argument into an ordered list of image files and a
//! default output directory.
//!
//! ## Accepted inputs
//!
//! ```text
//! photo.jpg          single file        → photo.jpg              out: ./INSTA
//! shoot/             directory          → shoot/*.{jpg,png,...}  out: shoot/INSTA
//! "shoot/*_edit.tif" glob pattern       → every match            out: shoot/INSTA
//! ```
//!
//! Directories are scanned non-recursively: only direct children count, so a
//! previous run's `INSTA/` folder is never picked up again. Extensions are
//! matched case-insensitively against the formats the decoder supports. The
//! result is de-duplicated and sorted so batch order is deterministic.

use crate::imaging::rust_backend::supported_input_extensions;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Name of the output folder created next to the inputs.
pub const DEFAULT_OUTPUT_DIR: &str = "INSTA";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Input not found: {0}")]
    NotFound(String),
    #[error("No images found in {0}")]
    NoImages(String),
}

/// Which kind of INPUT the user gave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
    Pattern,
}

/// Discovered images plus where their output goes by default.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub kind: InputKind,
    /// Sorted, de-duplicated image paths.
    pub images: Vec<PathBuf>,
    pub default_output: PathBuf,
}

/// Whether `path` has one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_ascii_lowercase();
            supported_input_extensions().contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn has_glob_chars(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Classify `input` without touching anything beyond a metadata lookup.
pub fn classify_input(input: &str) -> Result<InputKind, ScanError> {
    let path = Path::new(input);
    if path.is_dir() {
        Ok(InputKind::Directory)
    } else if path.is_file() {
        Ok(InputKind::File)
    } else if has_glob_chars(input) {
        Ok(InputKind::Pattern)
    } else {
        Err(ScanError::NotFound(input.to_string()))
    }
}

/// Resolve `input` to the images it names.
///
/// Finding nothing is an error ([`ScanError::NoImages`]), since there is
/// nothing useful a batch run can do with an empty set.
pub fn discover(input: &str) -> Result<Discovery, ScanError> {
    let kind = classify_input(input)?;
    let path = Path::new(input);

    let images = match kind {
        InputKind::File => is_supported_image(path)
            .then(|| path.to_path_buf())
            .into_iter()
            .collect(),
        InputKind::Directory => scan_directory(path)?,
        InputKind::Pattern => expand_pattern(input)?,
    };

    if images.is_empty() {
        return Err(ScanError::NoImages(input.to_string()));
    }

    let default_output = match kind {
        InputKind::Directory => path.join(DEFAULT_OUTPUT_DIR),
        InputKind::File | InputKind::Pattern => parent_dir(&images[0]).join(DEFAULT_OUTPUT_DIR),
    };

    Ok(Discovery {
        kind,
        images,
        default_output,
    })
}

/// Parent directory, with `.` standing in for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Direct children of `dir` with supported extensions.
fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut found = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            found.insert(entry.into_path());
        }
    }
    Ok(found.into_iter().collect())
}

/// Glob matches that are files with supported extensions.
///
/// Unreadable matches are skipped rather than failing the whole pattern.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, ScanError> {
    let found: BTreeSet<PathBuf> = glob::glob(pattern)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();
    Ok(found.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    // =========================================================================
    // Extension matching
    // =========================================================================

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(is_supported_image(Path::new("a.Png")));
        assert!(is_supported_image(Path::new("a.tif")));
        assert!(is_supported_image(Path::new("a.TIFF")));
        assert!(is_supported_image(Path::new("a.webp")));
    }

    #[test]
    fn unsupported_extensions_rejected() {
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("raw.cr2")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    // =========================================================================
    // Directory input
    // =========================================================================

    #[test]
    fn directory_lists_images_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "c.png");
        touch(tmp.path(), "a.jpg");
        touch(tmp.path(), "B.JPG");
        touch(tmp.path(), "notes.txt");

        let found = discover(tmp.path().to_str().unwrap()).unwrap();

        assert_eq!(found.kind, InputKind::Directory);
        assert_eq!(names(&found.images), vec!["B.JPG", "a.jpg", "c.png"]);
        assert_eq!(found.default_output, tmp.path().join("INSTA"));
    }

    #[test]
    fn directory_is_not_recursive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.jpg");
        let nested = tmp.path().join("INSTA");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "already-done.jpg");

        let found = discover(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(names(&found.images), vec!["top.jpg"]);
    }

    #[test]
    fn directory_without_images_is_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "readme.md");
        let result = discover(tmp.path().to_str().unwrap());
        assert!(matches!(result, Err(ScanError::NoImages(_))));
    }

    // =========================================================================
    // File input
    // =========================================================================

    #[test]
    fn single_file_outputs_beside_it() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "photo.jpeg");

        let found = discover(file.to_str().unwrap()).unwrap();

        assert_eq!(found.kind, InputKind::File);
        assert_eq!(found.images, vec![file]);
        assert_eq!(found.default_output, tmp.path().join("INSTA"));
    }

    #[test]
    fn single_unsupported_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "document.pdf");
        assert!(matches!(
            discover(file.to_str().unwrap()),
            Err(ScanError::NoImages(_))
        ));
    }

    #[test]
    fn missing_path_is_not_found() {
        assert!(matches!(
            discover("/definitely/not/here.jpg"),
            Err(ScanError::NotFound(_))
        ));
    }

    // =========================================================================
    // Glob input
    // =========================================================================

    #[test]
    fn glob_matches_and_filters() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "edit_1.jpg");
        touch(tmp.path(), "edit_2.png");
        touch(tmp.path(), "edit_notes.txt");
        touch(tmp.path(), "raw_1.jpg");

        let pattern = format!("{}/edit_*", tmp.path().display());
        let found = discover(&pattern).unwrap();

        assert_eq!(found.kind, InputKind::Pattern);
        assert_eq!(names(&found.images), vec!["edit_1.jpg", "edit_2.png"]);
        assert_eq!(found.default_output, tmp.path().join("INSTA"));
    }

    #[test]
    fn glob_without_matches_is_error() {
        let tmp = TempDir::new().unwrap();
        let pattern = format!("{}/*.jpg", tmp.path().display());
        assert!(matches!(discover(&pattern), Err(ScanError::NoImages(_))));
    }

    #[test]
    fn invalid_glob_is_error() {
        assert!(matches!(
            discover("/tmp/[unclosed*"),
            Err(ScanError::Pattern(_))
        ));
    }

    #[test]
    fn parent_of_bare_name_is_current_dir() {
        assert_eq!(parent_dir(Path::new("photo.jpg")), Path::new("."));
        assert_eq!(parent_dir(Path::new("a/photo.jpg")), Path::new("a"));
    }
}
