//! EXIF carry-over from source to output
//!
//! Pixels are never rotated during a resize, so a stale orientation tag would
//! make viewers rotate an already upright image. The source EXIF block is
//! copied into the output with its IFD0 orientation entry forced to normal.

use std::io::Cursor;

use exif::{In, Tag};
use tracing::debug;

use crate::error::JobError;

/// EXIF orientation value meaning "no rotation, no mirroring"
pub const ORIENTATION_NORMAL: u16 = 1;

const ORIENTATION_TAG: u16 = 0x0112;
const TIFF_SHORT: u16 = 3;
const EXIF_HEADER: &[u8] = b"Exif\0\0";
const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;

/// Parse the EXIF block of a source image, `None` when it has none
pub fn read_source_exif(data: &[u8]) -> Result<Option<exif::Exif>, JobError> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Raw TIFF-structured EXIF block with the orientation reset to normal
pub fn normalized_block(source: &exif::Exif) -> Result<Vec<u8>, JobError> {
    let mut tiff = source.buf().to_vec();

    if let Some(field) = source.get_field(Tag::Orientation, In::PRIMARY) {
        debug!(
            "Resetting EXIF orientation {} to {}",
            field.display_value(),
            ORIENTATION_NORMAL
        );
        set_orientation(&mut tiff, ORIENTATION_NORMAL)?;
    }

    Ok(tiff)
}

/// Rewrite the IFD0 orientation entry of a TIFF block in place
///
/// Returns `false` when IFD0 has no orientation entry.
pub fn set_orientation(tiff: &mut [u8], value: u16) -> Result<bool, JobError> {
    let order = ByteOrder::detect(tiff)?;
    let ifd = order.u32_at(tiff, 4)? as usize;
    let entries = order.u16_at(tiff, ifd)?;

    for i in 0..usize::from(entries) {
        let entry = ifd + 2 + i * 12;
        if order.u16_at(tiff, entry)? != ORIENTATION_TAG {
            continue;
        }

        let kind = order.u16_at(tiff, entry + 2)?;
        let count = order.u32_at(tiff, entry + 4)?;
        if kind != TIFF_SHORT || count != 1 {
            return Err(JobError::attribute(format!(
                "orientation entry has type {kind} and count {count}"
            )));
        }

        // Values that fit in four bytes are stored left-justified in the entry
        order.put_u16(tiff, entry + 8, value)?;
        return Ok(true);
    }

    Ok(false)
}

/// Embed a TIFF-structured EXIF block into a JPEG stream
///
/// Any EXIF segment already present is dropped. The new `APP1` segment goes
/// right after the leading `APP0` (JFIF) segments.
pub fn embed(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, JobError> {
    if !jpeg.starts_with(&SOI) {
        return Err(JobError::unknown("encoded output is not a JPEG stream"));
    }

    let segment_len = u16::try_from(2 + EXIF_HEADER.len() + tiff.len())
        .map_err(|_| JobError::attribute("EXIF block does not fit in one APP1 segment"))?;

    let mut app1 = Vec::with_capacity(usize::from(segment_len) + 2);
    app1.extend_from_slice(&[0xFF, APP1]);
    app1.extend_from_slice(&segment_len.to_be_bytes());
    app1.extend_from_slice(EXIF_HEADER);
    app1.extend_from_slice(tiff);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&SOI);

    let mut pos = SOI.len();
    let mut inserted = false;

    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF && (APP0..=0xEF).contains(&jpeg[pos + 1]) {
        let marker = jpeg[pos + 1];
        let len = usize::from(u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]));
        let end = pos + 2 + len;
        if len < 2 || end > jpeg.len() {
            return Err(JobError::unknown("encoded output has a truncated segment"));
        }

        let segment = &jpeg[pos..end];
        let is_exif = marker == APP1 && segment[4..].starts_with(EXIF_HEADER);

        if !is_exif {
            if marker != APP0 && !inserted {
                out.extend_from_slice(&app1);
                inserted = true;
            }
            out.extend_from_slice(segment);
        }

        pos = end;
    }

    if !inserted {
        out.extend_from_slice(&app1);
    }
    out.extend_from_slice(&jpeg[pos..]);

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn detect(tiff: &[u8]) -> Result<Self, JobError> {
        match tiff.get(..2) {
            Some(b"II") => Ok(Self::Little),
            Some(b"MM") => Ok(Self::Big),
            _ => Err(JobError::attribute("EXIF block has no TIFF byte-order mark")),
        }
    }

    fn bytes<const N: usize>(tiff: &[u8], offset: usize) -> Result<[u8; N], JobError> {
        tiff.get(offset..offset + N)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| JobError::attribute(format!("EXIF offset {offset} out of bounds")))
    }

    fn u16_at(self, tiff: &[u8], offset: usize) -> Result<u16, JobError> {
        let b = Self::bytes::<2>(tiff, offset)?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        })
    }

    fn u32_at(self, tiff: &[u8], offset: usize) -> Result<u32, JobError> {
        let b = Self::bytes::<4>(tiff, offset)?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        })
    }

    fn put_u16(self, tiff: &mut [u8], offset: usize, value: u16) -> Result<(), JobError> {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        let slot = tiff
            .get_mut(offset..offset + 2)
            .ok_or_else(|| JobError::attribute(format!("EXIF offset {offset} out of bounds")))?;
        slot.copy_from_slice(&bytes);
        Ok(())
    }
}
