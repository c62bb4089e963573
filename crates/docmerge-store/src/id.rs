use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::{StoreError, StoreResult};

const ID_BYTES: usize = 16;

/// Derives a fresh id from `title` and the current time.
///
/// `taken` is consulted for each candidate; the attempt counter is mixed into
/// the digest until a free id comes out.
pub fn generate_id(title: &str, taken: impl Fn(&str) -> bool) -> String {
    let timestamp = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros());

    let mut attempt: u64 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(attempt.to_le_bytes());
        let digest = hasher.finalize();

        let candidate: String = digest[..ID_BYTES]
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

pub fn validate_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
