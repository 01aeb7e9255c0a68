use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// SHA-256 over the fields a device reports for one call-log entry.
/// Re-syncing the same entry yields the same signature.
pub fn call_signature(device_id: &str, number: &str, started_at: DateTime<Utc>, duration_seconds: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(device_id.as_bytes());
    hasher.update(b"|");
    hasher.update(number.as_bytes());
    hasher.update(b"|");
    hasher.update(started_at.to_rfc3339_opts(SecondsFormat::Millis, true).as_bytes());
    hasher.update(b"|");
    hasher.update(duration_seconds.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest over a whole sync batch, returned to the device as a receipt.
pub fn batch_signature(signatures: &[String]) -> String {
    let mut hasher = Sha256::new();
    for sig in signatures {
        hasher.update(sig.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signature_is_stable_and_field_sensitive() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 10, 30, 0).unwrap();
        let a = call_signature("DEV_8829", "9876543210", at, 120);
        assert_eq!(a, call_signature("DEV_8829", "9876543210", at, 120));
        assert_eq!(a.len(), 64);
        assert_ne!(a, call_signature("DEV_4410", "9876543210", at, 120));
        assert_ne!(a, call_signature("DEV_8829", "9876543210", at, 121));
    }
}
