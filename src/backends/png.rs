//! PNG backend: randomized LSB embedding over RGB channels.
//!
//! Grounded in the classic "one bit (or two) per channel byte" LSB scheme,
//! generalized here with a keyed Fisher–Yates permutation over the
//! candidate bit positions so the embed order is not guessable from the
//! ciphertext alone.

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::error::EcapError;
use crate::header::{self, Header, HEADER_LEN};
use crate::prng::{derive_permute_key, fisher_yates_shuffle, Prng};

/// Bits consumed by the fixed (unpermuted) header region.
const HEADER_BITS: usize = HEADER_LEN * 8;

/// Default ceiling on decoded pixel count, per the resource model.
pub const DEFAULT_MAX_PIXELS: u64 = 256 * 1024 * 1024;

fn decode_rgba(carrier: &[u8], max_pixels: u64) -> Result<RgbaImage, EcapError> {
    let image = image::load_from_memory(carrier)
        .map_err(|_| EcapError::CarrierMalformed("not a decodable PNG"))?;
    let (w, h) = (image.width() as u64, image.height() as u64);
    if w.saturating_mul(h) > max_pixels {
        return Err(EcapError::CarrierMalformed(
            "decoded pixel count exceeds configured ceiling",
        ));
    }
    Ok(image.to_rgba8())
}

/// Raster-order byte offsets of the R, G, B channels (A channel skipped).
fn rgb_indices(pixel_count: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(pixel_count * 3);
    for pixel in 0..pixel_count {
        let base = pixel * 4;
        indices.push(base);
        indices.push(base + 1);
        indices.push(base + 2);
    }
    indices
}

/// `(byte_index, plane)` candidate positions built from the RGB bytes that
/// remain after the fixed header region.
fn payload_positions(rgb: &[usize], bits_per_channel: u8) -> Vec<(usize, u8)> {
    let mut positions = Vec::with_capacity(rgb.len() * bits_per_channel as usize);
    for &idx in rgb {
        positions.push((idx, 0));
        if bits_per_channel == 2 {
            positions.push((idx, 1));
        }
    }
    positions
}

fn set_lsb(byte: &mut u8, plane: u8, bit: u8) {
    *byte = (*byte & !(1 << plane)) | (bit << plane);
}

fn get_lsb(byte: u8, plane: u8) -> u8 {
    (byte >> plane) & 1
}

/// Embeds `header_bytes` (always MSB-first, one bit per RGB byte) and the
/// permuted `ciphertext` bits into `carrier`, returning a freshly encoded
/// PNG.
pub fn embed(
    carrier: &[u8],
    header_bytes: &[u8; HEADER_LEN],
    ciphertext: &[u8],
    permute_seed: &[u8; 32],
    bits_per_channel: u8,
    max_pixels: u64,
) -> Result<Vec<u8>, EcapError> {
    let mut image = decode_rgba(carrier, max_pixels)?;
    let (width, height) = (image.width(), image.height());
    let pixel_count = (width as usize) * (height as usize);
    let rgb = rgb_indices(pixel_count);

    if rgb.len() < HEADER_BITS {
        return Err(EcapError::CarrierTooSmall);
    }

    let pixels: &mut [u8] = &mut image;
    for bit_index in 0..HEADER_BITS {
        let byte = header_bytes[bit_index / 8];
        let bit = (byte >> (7 - (bit_index % 8))) & 1;
        set_lsb(&mut pixels[rgb[bit_index]], 0, bit);
    }

    let positions_src = &rgb[HEADER_BITS..];
    let mut positions = payload_positions(positions_src, bits_per_channel);

    let capacity_bits = positions.len();
    let needed_bits = ciphertext.len().saturating_mul(8);
    if capacity_bits < needed_bits {
        return Err(EcapError::CarrierTooSmall);
    }

    let mut prng = Prng::new(*permute_seed);
    fisher_yates_shuffle(&mut positions, &mut prng);

    log::debug!(
        "png embed: {} payload bits into {} candidate positions ({}x{}, {} bit/channel)",
        needed_bits,
        capacity_bits,
        width,
        height,
        bits_per_channel
    );

    let mut pos_iter = positions.into_iter();
    for &byte in ciphertext {
        for bit_pos in (0..8).rev() {
            let bit = (byte >> bit_pos) & 1;
            let (idx, plane) = pos_iter.next().expect("capacity checked above");
            set_lsb(&mut pixels[idx], plane, bit);
        }
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|_| EcapError::CarrierMalformed("failed to re-encode PNG"))?;
    Ok(out)
}

/// Reads the fixed-position 60-byte header (LSB of the first 480 RGB bytes)
/// without needing the password.
pub fn extract_header_bytes(
    carrier: &[u8],
    max_pixels: u64,
) -> Result<[u8; HEADER_LEN], EcapError> {
    let image = decode_rgba(carrier, max_pixels)?;
    let pixel_count = (image.width() as usize) * (image.height() as usize);
    let rgb = rgb_indices(pixel_count);
    if rgb.len() < HEADER_BITS {
        return Err(EcapError::CarrierTooSmall);
    }

    let pixels = image.as_raw();
    let mut out = [0u8; HEADER_LEN];
    for byte_index in 0..HEADER_LEN {
        let mut byte = 0u8;
        for bit_in_byte in 0..8 {
            let bit_index = byte_index * 8 + bit_in_byte;
            let bit = get_lsb(pixels[rgb[bit_index]], 0);
            byte = (byte << 1) | bit;
        }
        out[byte_index] = byte;
    }
    Ok(out)
}

/// Rebuilds the payload position list and permutation, then reads
/// `header.payload_len` ciphertext bytes.
pub fn extract_payload(
    carrier: &[u8],
    header: &Header,
    permute_seed: &[u8; 32],
    max_pixels: u64,
) -> Result<Vec<u8>, EcapError> {
    let image = decode_rgba(carrier, max_pixels)?;
    let pixel_count = (image.width() as usize) * (image.height() as usize);
    let rgb = rgb_indices(pixel_count);
    if rgb.len() < HEADER_BITS {
        return Err(EcapError::CarrierTooSmall);
    }

    let positions_src = &rgb[HEADER_BITS..];
    let mut positions = payload_positions(positions_src, header.bits_per_channel);

    let needed_bits = (header.payload_len as usize).saturating_mul(8);
    if positions.len() < needed_bits {
        return Err(EcapError::CarrierTooSmall);
    }

    let mut prng = Prng::new(*permute_seed);
    fisher_yates_shuffle(&mut positions, &mut prng);

    let pixels = image.as_raw();
    let mut out = vec![0u8; header.payload_len as usize];
    let mut pos_iter = positions.into_iter();
    for out_byte in out.iter_mut() {
        let mut byte = 0u8;
        for _ in 0..8 {
            let (idx, plane) = pos_iter.next().expect("capacity checked above");
            let bit = get_lsb(pixels[idx], plane);
            byte = (byte << 1) | bit;
        }
        *out_byte = byte;
    }
    Ok(out)
}

/// Computes the maximum ciphertext length (bytes) embeddable at
/// `bits_per_channel` for an image of the given dimensions.
pub fn capacity_bytes(width: u32, height: u32, bits_per_channel: u8) -> u64 {
    let pixel_count = width as u64 * height as u64;
    let rgb_bytes = pixel_count * 3;
    if rgb_bytes < HEADER_BITS as u64 {
        return 0;
    }
    let remaining = rgb_bytes - HEADER_BITS as u64;
    (remaining * bits_per_channel as u64) / 8
}

/// Derives the keyed seed used for the payload permutation from the
/// AEAD-derived key.
pub fn permute_seed(derived_key: &[u8]) -> [u8; 32] {
    derive_permute_key(derived_key)
}

pub use header::HEADER_LEN as PNG_HEADER_LEN;

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x * 4 % 256) as u8,
                (y * 4 % 256) as u8,
                ((x + y) % 256) as u8,
                255,
            ])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn header_round_trips_through_fixed_positions() {
        let carrier = gradient_png(64, 64);
        let header_bytes = [0xABu8; HEADER_LEN];
        let seed = [1u8; 32];
        let ciphertext = vec![0u8; 10];

        let encoded = embed(&carrier, &header_bytes, &ciphertext, &seed, 1, DEFAULT_MAX_PIXELS)
            .unwrap();
        let read_back = extract_header_bytes(&encoded, DEFAULT_MAX_PIXELS).unwrap();
        assert_eq!(read_back, header_bytes);
    }

    #[test]
    fn payload_round_trips_under_permutation() {
        let carrier = gradient_png(64, 64);
        let header_bytes = [0x11u8; HEADER_LEN];
        let seed = derive_permute_key(b"a derived key");
        let ciphertext = b"hello, hidden world!".to_vec();

        let encoded = embed(&carrier, &header_bytes, &ciphertext, &seed, 1, DEFAULT_MAX_PIXELS)
            .unwrap();

        let header = Header {
            flags: 0,
            bits_per_channel: 1,
            channels_mask: header::CHANNELS_MASK_RGB,
            payload_len: ciphertext.len() as u32,
            kdf: header::KDF_SCRYPT,
            log_n: 15,
            r: 8,
            p: 1,
            salt: [0u8; 16],
            iv: [0u8; 12],
            tag: [0u8; 16],
        };
        let decoded = extract_payload(&encoded, &header, &seed, DEFAULT_MAX_PIXELS).unwrap();
        assert_eq!(decoded, ciphertext);
    }

    #[test]
    fn capacity_too_small_is_rejected() {
        let carrier = gradient_png(8, 8); // 64 pixels * 3 = 192 rgb bytes < 480 header bits
        let header_bytes = [0u8; HEADER_LEN];
        let seed = [2u8; 32];
        let err = embed(&carrier, &header_bytes, b"x", &seed, 1, DEFAULT_MAX_PIXELS).unwrap_err();
        assert!(matches!(err, EcapError::CarrierTooSmall));
    }

    #[test]
    fn capacity_boundary_matches_formula() {
        // 64x64 at 1 bit/channel: (64*64*3 - 480) / 8 = 1476 bytes, per spec scenario 2.
        assert_eq!(capacity_bytes(64, 64, 1), 1476);
    }

    #[test]
    fn only_low_bits_of_touched_rgb_bytes_change() {
        let carrier = gradient_png(64, 64);
        let before = image::load_from_memory(&carrier).unwrap().to_rgba8();

        let header_bytes = [0x42u8; HEADER_LEN];
        let seed = [3u8; 32];
        let ciphertext = vec![0xAAu8; 50];
        let encoded = embed(&carrier, &header_bytes, &ciphertext, &seed, 1, DEFAULT_MAX_PIXELS)
            .unwrap();
        let after = image::load_from_memory(&encoded).unwrap().to_rgba8();

        assert_eq!(before.dimensions(), after.dimensions());
        for (b, a) in before.as_raw().iter().zip(after.as_raw().iter()) {
            assert_eq!(b & 0b1111_1110, a & 0b1111_1110, "high bits must be untouched");
        }
        // alpha channel must be untouched entirely
        for (p_before, p_after) in before.pixels().zip(after.pixels()) {
            assert_eq!(p_before.0[3], p_after.0[3]);
        }
    }
}
