//! Adaptive scrypt key derivation.
//!
//! Encoding starts at the preferred `log_n` and steps it down on a scrypt
//! memory-limit failure, retrying until it succeeds or bottoms out at
//! `MIN_LOG_N`. Decoding uses the stored `log_n` verbatim — no retry.

use scrypt::Params;
use thiserror::Error;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const PREFERRED_LOG_N: u8 = 15;
pub const MIN_LOG_N: u8 = 12;
pub const DEFAULT_R: u32 = 8;
pub const DEFAULT_P: u32 = 1;

/// Memory budget passed to scrypt's parameter validation, per spec.
const MEMORY_BUDGET_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum KdfError {
    #[error("key derivation parameters are not supported on this implementation")]
    Unsupported,

    #[error("scrypt failed: {0}")]
    Scrypt(String),
}

pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Derives a key at encode time, stepping `log_n` down from
/// [`PREFERRED_LOG_N`] to [`MIN_LOG_N`] on memory-limit failures.
///
/// Returns the derived key and the `log_n` actually used.
pub fn derive_adaptive(
    password: &[u8],
    salt: &[u8; 16],
    r: u32,
    p: u32,
) -> Result<(DerivedKey, u8), KdfError> {
    derive_adaptive_from(password, salt, PREFERRED_LOG_N, r, p)
}

/// As [`derive_adaptive`], but starting from a caller-chosen `log_n` (e.g.
/// a user's configured preference) instead of [`PREFERRED_LOG_N`].
pub fn derive_adaptive_from(
    password: &[u8],
    salt: &[u8; 16],
    start_log_n: u8,
    r: u32,
    p: u32,
) -> Result<(DerivedKey, u8), KdfError> {
    let mut log_n = start_log_n.clamp(MIN_LOG_N, PREFERRED_LOG_N.max(start_log_n));
    loop {
        match try_derive(password, salt, log_n, r, p) {
            Ok(key) => return Ok((key, log_n)),
            Err(KdfError::Scrypt(_)) if log_n > MIN_LOG_N => {
                log::warn!(
                    "scrypt log_n={log_n} exceeded the memory budget, stepping down to {}",
                    log_n - 1
                );
                log_n -= 1;
            }
            Err(KdfError::Scrypt(_)) => return Err(KdfError::Unsupported),
            Err(other) => return Err(other),
        }
    }
}

/// Derives a key at decode time using the exact parameters stored in the
/// header. No adaptive retry: a mismatch is propagated as-is.
pub fn derive_fixed(
    password: &[u8],
    salt: &[u8; 16],
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<DerivedKey, KdfError> {
    try_derive(password, salt, log_n, r, p)
}

fn try_derive(
    password: &[u8],
    salt: &[u8; 16],
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<DerivedKey, KdfError> {
    let params = Params::new(log_n, r, p, KEY_LEN).map_err(|e| classify(e.to_string()))?;
    if params_exceed_budget(log_n, r) {
        return Err(KdfError::Scrypt("memory budget exceeded".to_string()));
    }

    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(password, salt, &params, out.as_mut())
        .map_err(|e| classify(e.to_string()))?;
    Ok(out)
}

/// scrypt's peak memory is `128 * N * r` bytes.
fn params_exceed_budget(log_n: u8, r: u32) -> bool {
    let n = 1u64 << log_n;
    let bytes = 128u64.saturating_mul(n).saturating_mul(r as u64);
    bytes as usize > MEMORY_BUDGET_BYTES
}

fn classify(message: String) -> KdfError {
    KdfError::Scrypt(message)
}
