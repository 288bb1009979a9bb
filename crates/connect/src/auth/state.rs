//! Anti-CSRF state parameter
//!
//! The `state` value is the sole CSRF defense on the redirect round-trip,
//! so it must come from a cryptographically secure source. 32 random
//! bytes, hex-encoded.

use adspilot_domain::constants::STATE_TOKEN_BYTES;
use rand::RngCore;

/// Generate a random state token for CSRF protection.
///
/// Returns a hex-encoded string of [`STATE_TOKEN_BYTES`] random bytes
/// drawn from the OS-entropy-seeded thread RNG.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Validate that the state token received in a callback matches the one
/// stored when the flow was initiated.
///
/// Exact match only; anything else is a possible CSRF or stale callback.
#[must_use]
pub fn validate_state(expected: &str, received: &str) -> bool {
    expected == received
}
