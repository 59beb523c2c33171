//! Carrier-kind detection: magic-byte sniffing with an extension fallback.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierKind {
    Png,
    Jpeg,
    WebP,
    Trailer,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 2] = [0xFF, 0xD8];
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Detects the carrier kind by magic bytes first, falling back to the file
/// extension when the bytes are inconclusive. Unknown extensions fall back
/// to the trailer backend, per the dispatcher's precedence rules.
pub fn detect(bytes: &[u8], ext: &str) -> CarrierKind {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return CarrierKind::Png;
    }
    if bytes.starts_with(&JPEG_SIGNATURE) {
        return CarrierKind::Jpeg;
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return CarrierKind::WebP;
    }
    if bytes.starts_with(PDF_SIGNATURE) {
        return CarrierKind::Trailer;
    }

    match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => CarrierKind::Png,
        "jpg" | "jpeg" => CarrierKind::Jpeg,
        "webp" => CarrierKind::WebP,
        "pdf" => CarrierKind::Trailer,
        _ => CarrierKind::Trailer,
    }
}
