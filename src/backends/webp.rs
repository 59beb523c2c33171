//! WebP backend: an `ECAP` RIFF chunk appended after the existing chunks.

use crate::error::EcapError;

const RIFF_HEADER_LEN: usize = 12; // "RIFF" + size(4) + "WEBP"
const CHUNK_FOURCC: &[u8; 4] = b"ECAP";

fn validate_riff_webp(carrier: &[u8]) -> Result<(), EcapError> {
    if carrier.len() < RIFF_HEADER_LEN || &carrier[0..4] != b"RIFF" || &carrier[8..12] != b"WEBP" {
        return Err(EcapError::CarrierMalformed("missing RIFF/WEBP prefix"));
    }
    Ok(())
}

/// Appends an `ECAP` chunk (`header ‖ ciphertext`, little-endian size,
/// zero-padded to an even length) and rewrites the RIFF size.
pub fn embed(carrier: &[u8], header_bytes: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EcapError> {
    validate_riff_webp(carrier)?;

    let payload_len = header_bytes.len() + ciphertext.len();
    let pad = payload_len % 2 == 1;

    let mut out = Vec::with_capacity(carrier.len() + 8 + payload_len + pad as usize);
    out.extend_from_slice(carrier);
    out.extend_from_slice(CHUNK_FOURCC);
    out.extend_from_slice(&(payload_len as u32).to_le_bytes());
    out.extend_from_slice(header_bytes);
    out.extend_from_slice(ciphertext);
    if pad {
        out.push(0);
    }

    let body_len_after = out.len() - 8; // everything after "RIFF" + size field
    let riff_size = (body_len_after) as u32;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());

    log::debug!("webp embed: appended {payload_len}-byte ECAP chunk, new RIFF size {riff_size}");
    Ok(out)
}

/// Scans RIFF chunks from offset 12 and returns the body of the first
/// `ECAP` chunk found.
pub fn extract(carrier: &[u8]) -> Result<Vec<u8>, EcapError> {
    validate_riff_webp(carrier)?;

    let mut offset = RIFF_HEADER_LEN;
    while offset + 8 <= carrier.len() {
        let fourcc = &carrier[offset..offset + 4];
        let size = u32::from_le_bytes(carrier[offset + 4..offset + 8].try_into().expect("4 bytes"))
            as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .ok_or(EcapError::CarrierMalformed("WebP chunk size overflow"))?;
        if body_end > carrier.len() {
            return Err(EcapError::CarrierMalformed("truncated WebP chunk"));
        }
        if fourcc == CHUNK_FOURCC {
            return Ok(carrier[body_start..body_end].to_vec());
        }
        offset = body_end + (size % 2);
    }
    Err(EcapError::NoPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_webp() -> Vec<u8> {
        // RIFF size "0000" + "WEBP" + a minimal VP8 chunk.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(b"VP8 ");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        let riff_size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
        bytes
    }

    #[test]
    fn round_trip() {
        let carrier = minimal_webp();
        let header = vec![7u8; 60];
        let ciphertext = b"webp-test".to_vec();
        let encoded = embed(&carrier, &header, &ciphertext).unwrap();
        let extracted = extract(&encoded).unwrap();
        assert_eq!(&extracted[..60], header.as_slice());
        assert_eq!(&extracted[60..], ciphertext.as_slice());
    }

    #[test]
    fn riff_size_matches_original_plus_new_chunk() {
        let carrier = minimal_webp();
        let original_body_len = carrier.len() - 8;
        let header = vec![0u8; 60];
        let ciphertext = b"x".to_vec(); // payload_len = 61, odd -> one pad byte
        let encoded = embed(&carrier, &header, &ciphertext).unwrap();

        let new_riff_size = u32::from_le_bytes(encoded[4..8].try_into().unwrap()) as usize;
        let payload_len = header.len() + ciphertext.len();
        let pad = payload_len % 2;
        let chunk_len = 4 + 4 + payload_len + pad; // fourcc + size + body + pad
        assert_eq!(new_riff_size, original_body_len + chunk_len);
        assert_eq!(encoded.len(), 8 + new_riff_size);
    }

    #[test]
    fn odd_length_payload_is_padded() {
        let carrier = minimal_webp();
        let header = vec![0u8; 60]; // even
        let ciphertext = b"odd".to_vec(); // 3 bytes -> total 63, odd
        let encoded = embed(&carrier, &header, &ciphertext).unwrap();
        assert_eq!(encoded.len() % 2, 0, "RIFF chunks stay even-aligned");
        let extracted = extract(&encoded).unwrap();
        assert_eq!(extracted.len(), header.len() + ciphertext.len());
    }

    #[test]
    fn missing_payload_reports_no_payload() {
        let carrier = minimal_webp();
        assert!(matches!(extract(&carrier), Err(EcapError::NoPayload)));
    }
}
