//! Crate-wide error taxonomy.
//!
//! Every failure the codec can surface lives in [`EcapError`]. Individual
//! modules define narrower error types where it helps them stay
//! self-contained (see [`crate::kdf::KdfError`], [`crate::aead::AeadError`])
//! and convert into this enum at the module boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EcapError {
    #[error("carrier format not recognized")]
    CarrierUnrecognized,

    #[error("carrier is structurally malformed: {0}")]
    CarrierMalformed(&'static str),

    #[error("carrier does not have enough capacity for this payload")]
    CarrierTooSmall,

    #[error("header and ciphertext exceed the JPEG segment size limit; use a PNG carrier")]
    JpegSegmentOverflow,

    #[error("no embedded payload found")]
    NoPayload,

    #[error("invalid header: {0}")]
    BadHeader(&'static str),

    #[error("unsupported header version")]
    UnsupportedVersion,

    #[error("key derivation parameters are not supported")]
    KdfUnsupported,

    #[error("authentication failed (wrong password or tampered data)")]
    AuthFail,

    #[error("operation cancelled")]
    Cancelled,
}
