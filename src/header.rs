//! The 60-byte self-describing record prefixing every embedded payload.
//!
//! Layout (all multi-byte integers big-endian):
//!
//! ```text
//! 0   4   magic             ASCII "ECAP"
//! 4   1   version           0x01
//! 5   1   flags             bit0 = encrypted, bit1 = randomized
//! 6   1   bits_per_channel  1 or 2 (PNG only; 1 elsewhere)
//! 7   1   channels_mask     0b00000111 (RGB)
//! 8   4   payload_len       plaintext/ciphertext byte length
//! 12  1   kdf               0x01 = scrypt
//! 13  1   log_n             scrypt log2(N) actually used
//! 14  1   r                 scrypt r
//! 15  1   p                 scrypt p
//! 16  16  salt
//! 32  12  iv
//! 44  16  tag               GCM authentication tag
//! ```

use crate::error::EcapError;

pub const MAGIC: &[u8; 4] = b"ECAP";
pub const VERSION: u8 = 0x01;
pub const KDF_SCRYPT: u8 = 0x01;
pub const CHANNELS_MASK_RGB: u8 = 0b0000_0111;
pub const HEADER_LEN: usize = 60;

pub const FLAG_ENCRYPTED: u8 = 0b0000_0001;
pub const FLAG_RANDOMIZED: u8 = 0b0000_0010;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub flags: u8,
    pub bits_per_channel: u8,
    pub channels_mask: u8,
    pub payload_len: u32,
    pub kdf: u8,
    pub log_n: u8,
    pub r: u8,
    pub p: u8,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
}

impl Header {
    pub fn is_randomized(&self) -> bool {
        self.flags & FLAG_RANDOMIZED != 0
    }
}

/// Serializes `header` into exactly [`HEADER_LEN`] bytes.
pub fn serialize(header: &Header) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[0..4].copy_from_slice(MAGIC);
    out[4] = VERSION;
    out[5] = header.flags;
    out[6] = header.bits_per_channel;
    out[7] = header.channels_mask;
    out[8..12].copy_from_slice(&header.payload_len.to_be_bytes());
    out[12] = header.kdf;
    out[13] = header.log_n;
    out[14] = header.r;
    out[15] = header.p;
    out[16..32].copy_from_slice(&header.salt);
    out[32..44].copy_from_slice(&header.iv);
    out[44..60].copy_from_slice(&header.tag);
    out
}

/// Parses a [`Header`] from `bytes`, requiring `bytes.len() >= HEADER_LEN`.
///
/// Does not validate `payload_len` against any ciphertext slice — that check
/// belongs to the caller supplying the ciphertext.
pub fn parse(bytes: &[u8]) -> Result<Header, EcapError> {
    if bytes.len() < HEADER_LEN {
        return Err(EcapError::BadHeader("truncated header"));
    }
    if &bytes[0..4] != MAGIC {
        return Err(EcapError::BadHeader("magic mismatch"));
    }
    let version = bytes[4];
    if version != VERSION {
        return Err(EcapError::UnsupportedVersion);
    }

    let flags = bytes[5];
    let bits_per_channel = bytes[6];
    if bits_per_channel != 1 && bits_per_channel != 2 {
        return Err(EcapError::BadHeader("bits_per_channel out of range"));
    }
    let channels_mask = bytes[7];
    if channels_mask != CHANNELS_MASK_RGB {
        return Err(EcapError::BadHeader("unsupported channel mask"));
    }
    let payload_len = u32::from_be_bytes(bytes[8..12].try_into().expect("4 bytes"));
    if payload_len > i32::MAX as u32 {
        return Err(EcapError::BadHeader("payload_len out of range"));
    }

    let kdf = bytes[12];
    if kdf != KDF_SCRYPT {
        return Err(EcapError::KdfUnsupported);
    }
    let log_n = bytes[13];
    if !(12..=20).contains(&log_n) {
        return Err(EcapError::BadHeader("log_n out of range"));
    }
    let r = bytes[14];
    if r < 1 {
        return Err(EcapError::BadHeader("r out of range"));
    }
    let p = bytes[15];
    if p < 1 {
        return Err(EcapError::BadHeader("p out of range"));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[16..32]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&bytes[32..44]);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&bytes[44..60]);

    Ok(Header {
        flags,
        bits_per_channel,
        channels_mask,
        payload_len,
        kdf,
        log_n,
        r,
        p,
        salt,
        iv,
        tag,
    })
}
