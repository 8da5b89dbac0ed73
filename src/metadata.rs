//! EXIF allow-list filtering.
//!
//! Output images carry either no metadata at all (the default) or a small,
//! fixed subset of the source's EXIF:
//!
//! - **GPS**: every field of the primary image's GPS IFD, so location-aware
//!   apps can still place the photo.
//! - **Timestamps**: `DateTime`, `DateTimeOriginal`, `DateTimeDigitized`.
//!
//! Everything else is dropped: camera make/model, lens and exposure data,
//! software tags, maker notes, the IFD1 thumbnail. Orientation is dropped
//! too, because pixels are already rotated upright at decode time and a
//! surviving tag would rotate them a second time.
//!
//! ## Error model
//!
//! Parsing and serialization return [`MetadataError`]. A source whose EXIF
//! cannot be parsed is treated as having none: [`filter_or_empty`] turns the
//! error into an empty [`TrimmedMetadata`] so the image still gets processed.

use exif::experimental::Writer;
use exif::{Context, Field, In, Reader, Tag, Value};
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("EXIF parse failed: {0}")]
    Parse(exif::Error),
    #[error("EXIF write failed: {0}")]
    Write(exif::Error),
}

/// Timestamp tags kept alongside the GPS IFD.
const TIMESTAMP_TAGS: &[Tag] = &[Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];

/// The allow-listed subset of a source image's EXIF.
///
/// Always present, possibly empty. Remembers the source byte order so the
/// serialized block matches what the camera wrote.
#[derive(Debug, Clone, Default)]
pub struct TrimmedMetadata {
    fields: Vec<Field>,
    little_endian: bool,
}

/// Whether a field survives trimming.
pub fn is_allowed(field: &Field) -> bool {
    field.ifd_num == In::PRIMARY
        && (field.tag.context() == Context::Gps || TIMESTAMP_TAGS.contains(&field.tag))
}

/// Keep only allow-listed fields, first occurrence wins.
pub fn trim<'a>(fields: impl IntoIterator<Item = &'a Field>, little_endian: bool) -> TrimmedMetadata {
    let mut kept: Vec<Field> = Vec::new();
    for field in fields {
        if is_allowed(field) && !kept.iter().any(|f| f.tag == field.tag) {
            kept.push(field.clone());
        }
    }
    TrimmedMetadata {
        fields: kept,
        little_endian,
    }
}

/// Parse a raw TIFF-structured EXIF block and trim it.
pub fn read(raw: &[u8]) -> Result<TrimmedMetadata, MetadataError> {
    let exif = Reader::new()
        .read_raw(raw.to_vec())
        .map_err(MetadataError::Parse)?;
    Ok(trim(exif.fields(), exif.little_endian()))
}

/// Trim `raw` if present, treating unparseable EXIF as absent.
pub fn filter_or_empty(raw: Option<&[u8]>) -> TrimmedMetadata {
    let Some(raw) = raw else {
        return TrimmedMetadata::default();
    };
    read(raw).unwrap_or_else(|e| {
        warn!(error = %e, "discarding unreadable EXIF");
        TrimmedMetadata::default()
    })
}

impl TrimmedMetadata {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.fields.iter().map(|f| f.tag)
    }

    /// Serialize to a TIFF-structured EXIF block for embedding.
    ///
    /// Returns `Ok(None)` when nothing is left to write. Fields whose value
    /// type the writer cannot express are skipped.
    pub fn to_exif_bytes(&self) -> Result<Option<Vec<u8>>, MetadataError> {
        let mut writer = Writer::new();
        let mut pushed = 0;
        for field in &self.fields {
            if matches!(field.value, Value::Unknown(..)) {
                debug!(tag = %field.tag, "skipping field with unknown value type");
                continue;
            }
            writer.push_field(field);
            pushed += 1;
        }
        if pushed == 0 {
            return Ok(None);
        }

        let mut buf = Cursor::new(Vec::new());
        writer
            .write(&mut buf, self.little_endian)
            .map_err(MetadataError::Write)?;
        Ok(Some(buf.into_inner()))
    }
}
