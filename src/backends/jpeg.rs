//! JPEG backend: a single APP15 (0xFFEF) marker segment carrying the
//! header and ciphertext, inserted right after SOI and before the first
//! SOS/EOI/restart marker.
//!
//! This backend never decodes scan data; it only walks the marker
//! structure, so it needs no JPEG pixel codec.

use crate::error::EcapError;

const SOI: u8 = 0xD8;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const APP15: u8 = 0xEF;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;

/// Segment length field (2 bytes) includes itself, so the maximum blob
/// (header + ciphertext) is `u16::MAX - 2`.
const MAX_SEGMENT_BLOB: usize = 65_533;

fn is_stop_marker(marker: u8) -> bool {
    marker == SOS || marker == EOI || (RST0..=RST7).contains(&marker)
}

/// Finds the byte offset right after SOI where a new APP15 segment should
/// be inserted: right before the first SOS, EOI, or restart marker.
fn find_insertion_point(carrier: &[u8]) -> Result<usize, EcapError> {
    if carrier.len() < 2 || carrier[0] != 0xFF || carrier[1] != SOI {
        return Err(EcapError::CarrierMalformed("missing JPEG SOI marker"));
    }

    let mut offset = 2usize;
    while offset + 1 < carrier.len() {
        if carrier[offset] != 0xFF {
            return Err(EcapError::CarrierMalformed("expected marker byte 0xFF"));
        }
        let marker = carrier[offset + 1];
        if is_stop_marker(marker) {
            return Ok(offset);
        }
        if offset + 3 >= carrier.len() {
            return Err(EcapError::CarrierMalformed("truncated JPEG segment"));
        }
        let len = u16::from_be_bytes([carrier[offset + 2], carrier[offset + 3]]) as usize;
        if len < 2 {
            return Err(EcapError::CarrierMalformed("invalid JPEG segment length"));
        }
        offset += 2 + len;
    }
    Err(EcapError::CarrierMalformed(
        "reached end of file before SOS/EOI",
    ))
}

/// Inserts `header_bytes ‖ ciphertext` into a fresh APP15 segment.
pub fn embed(
    carrier: &[u8],
    header_bytes: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EcapError> {
    let insertion_point = find_insertion_point(carrier)?;

    let blob_len = header_bytes.len() + ciphertext.len();
    if blob_len > MAX_SEGMENT_BLOB {
        return Err(EcapError::JpegSegmentOverflow);
    }

    log::debug!("jpeg embed: inserting {blob_len}-byte APP15 segment at offset {insertion_point}");

    let segment_len = (blob_len + 2) as u16;
    let mut out = Vec::with_capacity(carrier.len() + 4 + blob_len);
    out.extend_from_slice(&carrier[..insertion_point]);
    out.push(0xFF);
    out.push(APP15);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(header_bytes);
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(&carrier[insertion_point..]);
    Ok(out)
}

/// Scans marker segments and returns the payload of the first APP15
/// segment whose body starts with the ECAP magic.
pub fn extract(carrier: &[u8]) -> Result<Vec<u8>, EcapError> {
    if carrier.len() < 2 || carrier[0] != 0xFF || carrier[1] != SOI {
        return Err(EcapError::CarrierMalformed("missing JPEG SOI marker"));
    }

    let mut offset = 2usize;
    while offset + 1 < carrier.len() {
        if carrier[offset] != 0xFF {
            return Err(EcapError::CarrierMalformed("expected marker byte 0xFF"));
        }
        let marker = carrier[offset + 1];
        if is_stop_marker(marker) {
            break;
        }
        if offset + 3 >= carrier.len() {
            return Err(EcapError::CarrierMalformed("truncated JPEG segment"));
        }
        let len = u16::from_be_bytes([carrier[offset + 2], carrier[offset + 3]]) as usize;
        if len < 2 || offset + 2 + len > carrier.len() {
            return Err(EcapError::CarrierMalformed("invalid JPEG segment length"));
        }
        let body = &carrier[offset + 4..offset + 2 + len];
        if marker == APP15 && body.len() >= 4 && &body[0..4] == crate::header::MAGIC {
            return Ok(body.to_vec());
        }
        offset += 2 + len;
    }
    Err(EcapError::NoPayload)
}
