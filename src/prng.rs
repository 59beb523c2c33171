//! Counter-mode HMAC-SHA-256 byte stream and the Fisher–Yates permutation
//! it drives for PNG payload-bit scattering.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// ASCII label used to derive the PRNG key from the KDF output, so the
/// permutation key is domain-separated from the AEAD key.
pub const PERMUTE_LABEL: &[u8] = b"ECAP-PERMUTE";

pub struct Prng {
    key: [u8; 32],
    counter: u32,
    buffer: [u8; 32],
    pos: usize,
}

impl Prng {
    pub fn new(key: [u8; 32]) -> Self {
        let mut prng = Self {
            key,
            counter: 0,
            buffer: [0u8; 32],
            pos: 32,
        };
        prng.refill();
        prng
    }

    fn refill(&mut self) {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(&self.counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        self.buffer.copy_from_slice(&digest);
        self.counter = self.counter.wrapping_add(1);
        self.pos = 0;
    }

    pub fn next_byte(&mut self) -> u8 {
        if self.pos == self.buffer.len() {
            self.refill();
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        byte
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        for b in &mut bytes {
            *b = self.next_byte();
        }
        u32::from_be_bytes(bytes)
    }
}

/// Derives the PRNG seed key from the AEAD-derived key:
/// `HMAC_SHA256(derived_key, "ECAP-PERMUTE")`.
pub fn derive_permute_key(derived_key: &[u8]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(derived_key).expect("HMAC accepts any key length");
    mac.update(PERMUTE_LABEL);
    let digest = mac.finalize().into_bytes();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Fisher–Yates shuffle of `items`, consuming `prng` for the swap indices.
///
/// For `i` from `items.len() - 1` down to 1, draws `j = prng.next_u32() mod
/// (i + 1)` and swaps `items[i]` with `items[j]`.
pub fn fisher_yates_shuffle<T>(items: &mut [T], prng: &mut Prng) {
    if items.is_empty() {
        return;
    }
    for i in (1..items.len()).rev() {
        let j = (prng.next_u32() as u64 % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
