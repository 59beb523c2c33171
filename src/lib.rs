//! `ecap_core` — the stego codec core.
//!
//! Two pure functions, [`encode`] and [`decode`], embed and extract a short
//! authenticated-encrypted message in an ordinary carrier file (PNG, JPEG,
//! WebP, or arbitrary binary). Everything else in this crate — the header
//! codec, KDF, AEAD, PRNG, and per-format backends — exists to support
//! those two entry points. There is no process-wide state; every call is a
//! pure function of its inputs.

pub mod aead;
pub mod backends;
pub mod carrier;
pub mod error;
pub mod header;
pub mod kdf;
pub mod prng;

use backends::{jpeg, png, trailer, webp};
use carrier::CarrierKind;
use error::EcapError;
use header::{Header, CHANNELS_MASK_RGB, FLAG_ENCRYPTED, FLAG_RANDOMIZED, HEADER_LEN, KDF_SCRYPT};
use rand::rngs::OsRng;
use rand::RngCore;

/// Options governing encode-side format parameters. Decode always reads
/// the parameters the header actually stored.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// PNG LSB planes per RGB channel: 1 or 2. Ignored for non-PNG
    /// carriers, which always use 1.
    pub bits_per_channel: u8,
    /// Ceiling on decoded PNG pixel count, to bound memory use.
    pub max_pixels: u64,
    /// scrypt `log_n` to start adaptive derivation from, before any
    /// memory-limit step-down. Ignored on decode, which always uses the
    /// `log_n` stored in the header.
    pub preferred_log_n: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            bits_per_channel: 1,
            max_pixels: png::DEFAULT_MAX_PIXELS,
            preferred_log_n: kdf::PREFERRED_LOG_N,
        }
    }
}

/// Encrypts `plaintext` under `password` and embeds it into `carrier`,
/// returning the new carrier bytes. `carrier_ext` is used only as a
/// fallback when the carrier's magic bytes don't identify its format.
pub fn encode(
    carrier: &[u8],
    carrier_ext: &str,
    plaintext: &[u8],
    password: &[u8],
) -> Result<Vec<u8>, EcapError> {
    encode_with_options(carrier, carrier_ext, plaintext, password, EncodeOptions::default())
}

pub fn encode_with_options(
    carrier: &[u8],
    carrier_ext: &str,
    plaintext: &[u8],
    password: &[u8],
    options: EncodeOptions,
) -> Result<Vec<u8>, EcapError> {
    if plaintext.len() > i32::MAX as usize {
        return Err(error::EcapError::BadHeader("plaintext too large"));
    }

    let kind = carrier::detect(carrier, carrier_ext);
    log::debug!("encode: detected carrier kind {kind:?}");

    let mut salt = [0u8; header::SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; header::IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let (key, log_n_used) = kdf::derive_adaptive_from(
        password,
        &salt,
        options.preferred_log_n,
        kdf::DEFAULT_R,
        kdf::DEFAULT_P,
    )
    .map_err(|_| EcapError::KdfUnsupported)?;

    let (ciphertext, tag) =
        aead::encrypt(&key, &iv, plaintext).map_err(|_| EcapError::AuthFail)?;

    let bits_per_channel = if kind == CarrierKind::Png {
        options.bits_per_channel
    } else {
        1
    };
    let mut flags = FLAG_ENCRYPTED;
    if kind == CarrierKind::Png {
        flags |= FLAG_RANDOMIZED;
    }

    let header = Header {
        flags,
        bits_per_channel,
        channels_mask: CHANNELS_MASK_RGB,
        payload_len: plaintext.len() as u32,
        kdf: KDF_SCRYPT,
        log_n: log_n_used,
        r: kdf::DEFAULT_R as u8,
        p: kdf::DEFAULT_P as u8,
        salt,
        iv,
        tag,
    };
    let header_bytes = header::serialize(&header);

    match kind {
        CarrierKind::Png => {
            let seed = png::permute_seed(key.as_slice());
            png::embed(carrier, &header_bytes, &ciphertext, &seed, bits_per_channel, options.max_pixels)
        }
        CarrierKind::Jpeg => jpeg::embed(carrier, &header_bytes, &ciphertext),
        CarrierKind::WebP => webp::embed(carrier, &header_bytes, &ciphertext),
        CarrierKind::Trailer => Ok(trailer::embed(carrier, &header_bytes, &ciphertext)),
    }
}

/// Extracts and decrypts a message previously embedded by [`encode`].
///
/// Tries the PNG LSB path first; on any failure falls back to JPEG, then
/// WebP, then the generic trailer, returning the first success. Reports
/// [`EcapError::NoPayload`] only if no backend finds a header-prefixed
/// blob at all; a password/tamper failure after a header was located is
/// reported as [`EcapError::AuthFail`] (or the specific header error).
pub fn decode(carrier: &[u8], password: &[u8]) -> Result<Vec<u8>, EcapError> {
    decode_with_options(carrier, password, EncodeOptions::default())
}

pub fn decode_with_options(
    carrier: &[u8],
    password: &[u8],
    options: EncodeOptions,
) -> Result<Vec<u8>, EcapError> {
    let attempts: [fn(&[u8], &[u8], u64) -> AttemptResult; 4] =
        [try_png, try_jpeg, try_webp, try_trailer];

    let mut best_error: Option<EcapError> = None;
    for attempt in attempts {
        match attempt(carrier, password, options.max_pixels) {
            Ok(plaintext) => return Ok(plaintext),
            Err((err, found_header)) => {
                if found_header {
                    best_error = Some(err);
                }
            }
        }
    }

    // No backend ever located a well-formed 60-byte header: per spec §4.9,
    // that's NoPayload, not whichever backend happened to fail first.
    Err(best_error.unwrap_or(EcapError::NoPayload))
}

/// `(error, found_header)` — `found_header` is true once a well-formed
/// 60-byte header was parsed, even if a later step (KDF/AEAD) failed.
type AttemptResult = Result<Vec<u8>, (EcapError, bool)>;

fn try_png(carrier: &[u8], password: &[u8], max_pixels: u64) -> AttemptResult {
    let header_bytes = png::extract_header_bytes(carrier, max_pixels).map_err(|e| (e, false))?;
    let header = header::parse(&header_bytes).map_err(|e| (e, false))?;

    let key = kdf::derive_fixed(
        password,
        &header.salt,
        header.log_n,
        header.r as u32,
        header.p as u32,
    )
    .map_err(|_| (EcapError::KdfUnsupported, true))?;

    let seed = png::permute_seed(key.as_slice());
    let ciphertext =
        png::extract_payload(carrier, &header, &seed, max_pixels).map_err(|e| (e, true))?;
    aead::decrypt(&key, &header.iv, &ciphertext, &header.tag)
        .map(|zeroizing| zeroizing.to_vec())
        .map_err(|_| (EcapError::AuthFail, true))
}

fn decode_blob(blob: &[u8], password: &[u8]) -> AttemptResult {
    if blob.len() < HEADER_LEN {
        return Err((EcapError::BadHeader("blob shorter than header"), false));
    }
    let header = header::parse(&blob[..HEADER_LEN]).map_err(|e| (e, false))?;

    let ciphertext_available = &blob[HEADER_LEN..];
    if ciphertext_available.len() < header.payload_len as usize {
        return Err((EcapError::BadHeader("blob shorter than payload_len"), true));
    }
    let ciphertext = &ciphertext_available[..header.payload_len as usize];

    let key = kdf::derive_fixed(
        password,
        &header.salt,
        header.log_n,
        header.r as u32,
        header.p as u32,
    )
    .map_err(|_| (EcapError::KdfUnsupported, true))?;

    aead::decrypt(&key, &header.iv, ciphertext, &header.tag)
        .map(|zeroizing| zeroizing.to_vec())
        .map_err(|_| (EcapError::AuthFail, true))
}

fn try_jpeg(carrier: &[u8], password: &[u8], _max_pixels: u64) -> AttemptResult {
    let blob = jpeg::extract(carrier).map_err(|e| (e, false))?;
    decode_blob(&blob, password)
}

fn try_webp(carrier: &[u8], password: &[u8], _max_pixels: u64) -> AttemptResult {
    let blob = webp::extract(carrier).map_err(|e| (e, false))?;
    decode_blob(&blob, password)
}

fn try_trailer(carrier: &[u8], password: &[u8], _max_pixels: u64) -> AttemptResult {
    let blob = trailer::extract(carrier).map_err(|e| (e, false))?;
    decode_blob(&blob, password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn gradient_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 4 % 256) as u8, (y * 4 % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn minimal_jpeg() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(b"JFIF\0");
        bytes.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
        bytes.extend_from_slice(&[0xFF, 0xDA]);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    fn minimal_webp() -> Vec<u8> {
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

    fn test_options() -> EncodeOptions {
        EncodeOptions::default()
    }

    #[test]
    fn png_round_trip_scenario_1() {
        let carrier = gradient_png(64, 64);
        let encoded = encode(&carrier, "png", b"hello", b"pw").unwrap();
        let decoded = decode(&encoded, b"pw").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn png_capacity_exceeded_fails() {
        let carrier = gradient_png(64, 64);
        let plaintext = vec![0u8; 10_000]; // capacity is 1476 bytes per spec scenario 2
        let err = encode(&carrier, "png", &plaintext, b"pw").unwrap_err();
        assert!(matches!(err, EcapError::CarrierTooSmall));
    }

    #[test]
    fn jpeg_round_trip_scenario_3() {
        let carrier = minimal_jpeg();
        let encoded = encode(&carrier, "jpg", b"x", b"pw").unwrap();
        let decoded = decode(&encoded, b"pw").unwrap();
        assert_eq!(decoded, b"x");
    }

    #[test]
    fn jpeg_oversized_payload_overflows_scenario_3() {
        let carrier = minimal_jpeg();
        let plaintext = vec![0u8; 70_000];
        let err = encode(&carrier, "jpg", &plaintext, b"pw").unwrap_err();
        assert!(matches!(err, EcapError::JpegSegmentOverflow));
    }

    #[test]
    fn webp_round_trip_scenario_4() {
        let carrier = minimal_webp();
        let encoded = encode(&carrier, "webp", b"webp-test", b"pw").unwrap();
        let decoded = decode(&encoded, b"pw").unwrap();
        assert_eq!(decoded, b"webp-test");
    }

    #[test]
    fn trailer_round_trip_scenario_5() {
        let carrier: Vec<u8> = (0..100u16).map(|b| b as u8).collect();
        let message = "τëst-🙂".as_bytes();
        let encoded = encode(&carrier, "bin", message, b"pw").unwrap();
        let decoded = decode(&encoded, b"pw").unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn wrong_password_fails_auth() {
        let carrier = gradient_png(64, 64);
        let encoded = encode(&carrier, "png", b"secret", b"a").unwrap();
        let err = decode(&encoded, b"b").unwrap_err();
        assert!(matches!(err, EcapError::AuthFail));
    }

    #[test]
    fn bit_flip_in_png_pixels_fails_auth_scenario_6() {
        let carrier = gradient_png(64, 64);
        let mut encoded = encode(&carrier, "png", b"secret", b"a").unwrap();
        let image = image::load_from_memory(&encoded).unwrap().to_rgba8();
        let _ = image; // confirm still decodable before corrupting raw bytes
        // Flip the low bit of the first byte after the PNG signature+IHDR
        // area is indirect to target via pixels, so instead corrupt through
        // a full decode/re-encode cycle: flip bit 0 of decoded pixel (0,0) R.
        let mut img = image::load_from_memory(&encoded).unwrap().to_rgba8();
        img.get_pixel_mut(0, 0).0[0] ^= 1;
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        encoded = out;

        let err = decode(&encoded, b"a").unwrap_err();
        assert!(matches!(err, EcapError::AuthFail | EcapError::BadHeader(_)));
    }

    #[test]
    fn tamper_in_trailer_ciphertext_fails_auth() {
        let carrier: Vec<u8> = vec![0u8; 64];
        let mut encoded = encode(&carrier, "bin", b"secret message", b"pw").unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        let err = decode(&encoded, b"pw").unwrap_err();
        assert!(matches!(err, EcapError::AuthFail));
    }

    #[test]
    fn header_invariance_round_trip() {
        let h = Header {
            flags: FLAG_ENCRYPTED,
            bits_per_channel: 1,
            channels_mask: CHANNELS_MASK_RGB,
            payload_len: 5,
            kdf: KDF_SCRYPT,
            log_n: 14,
            r: 8,
            p: 1,
            salt: [1u8; header::SALT_LEN],
            iv: [2u8; header::IV_LEN],
            tag: [3u8; header::TAG_LEN],
        };
        let bytes = header::serialize(&h);
        assert_eq!(header::parse(&bytes).unwrap(), h);
    }

    #[test]
    fn decode_of_payload_free_jpeg_reports_no_payload() {
        // None of PNG/JPEG/WebP/trailer locates a header here; the PNG
        // attempt fails first (not a decodable PNG) but must not mask the
        // other backends' verdict.
        let carrier = minimal_jpeg();
        let err = decode(&carrier, b"pw").unwrap_err();
        assert!(matches!(err, EcapError::NoPayload));
    }

    #[test]
    fn bits_per_channel_two_is_opt_in_and_round_trips() {
        let carrier = gradient_png(64, 64);
        let options = EncodeOptions {
            bits_per_channel: 2,
            ..test_options()
        };
        let encoded =
            encode_with_options(&carrier, "png", b"two bits per channel", b"pw", options).unwrap();
        let decoded = decode(&encoded, b"pw").unwrap();
        assert_eq!(decoded, b"two bits per channel");
    }
}
