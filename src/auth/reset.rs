use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// OTPs and reset tickets share the same validity window.
pub const RESET_WINDOW_MINUTES: i64 = 10;

pub fn reset_expiry() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::minutes(RESET_WINDOW_MINUTES)
}

/// Six-digit numeric code, zero-padded, uniformly random.
pub fn generate_otp() -> String {
    let n: u32 = rand::rngs::OsRng.gen_range(0..1_000_000);
    format!("{n:06}")
}

/// One-time reset ticket: 32 random bytes, hex-encoded. Returned to the
/// caller unhashed exactly once; only its digest is stored.
pub fn generate_reset_ticket() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest, hex-encoded. Applied to OTPs and reset tickets before
/// they touch the database.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
