//! Trailer backend: the fallback for arbitrary binary carriers. Appends
//! `ECAPTR ‖ be32(len) ‖ header ‖ ciphertext` with no closing sentinel.

use crate::error::EcapError;

pub const SIGNATURE: &[u8; 6] = b"ECAPTR";

/// Appends the trailer signature, length prefix, header, and ciphertext.
pub fn embed(carrier: &[u8], header_bytes: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let payload_len = (header_bytes.len() + ciphertext.len()) as u32;
    log::debug!("trailer embed: appending {payload_len}-byte blob");

    let mut out = Vec::with_capacity(carrier.len() + SIGNATURE.len() + 4 + payload_len as usize);
    out.extend_from_slice(carrier);
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&payload_len.to_be_bytes());
    out.extend_from_slice(header_bytes);
    out.extend_from_slice(ciphertext);
    out
}

/// Locates the *last* occurrence of the trailer signature and reads the
/// `header ‖ ciphertext` blob that follows it.
pub fn extract(carrier: &[u8]) -> Result<Vec<u8>, EcapError> {
    let marker_pos = carrier
        .windows(SIGNATURE.len())
        .rposition(|window| window == SIGNATURE)
        .ok_or(EcapError::NoPayload)?;

    let len_start = marker_pos + SIGNATURE.len();
    if carrier.len() < len_start + 4 {
        return Err(EcapError::CarrierMalformed("truncated trailer length field"));
    }
    let len =
        u32::from_be_bytes(carrier[len_start..len_start + 4].try_into().expect("4 bytes")) as usize;

    let blob_start = len_start + 4;
    let blob_end = blob_start
        .checked_add(len)
        .ok_or(EcapError::CarrierMalformed("trailer length overflow"))?;
    if blob_end > carrier.len() {
        return Err(EcapError::CarrierMalformed("trailer blob exceeds carrier length"));
    }

    Ok(carrier[blob_start..blob_end].to_vec())
}
