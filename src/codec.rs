//! Fixed-width key/value encoding.
//!
//! Every workload addresses the store through the same index-to-record
//! mapping, so a reader can reconstruct the key for any previously written
//! index without shared state. All functions here are pure and safe to call
//! concurrently.

use std::time::{SystemTime, UNIX_EPOCH};

/// Encode `idx` as exactly `key_size` bytes: the zero-padded decimal form.
///
/// If the decimal form is longer than `key_size`, the trailing digits are
/// dropped. That silently collapses distinct indices onto one key, so
/// callers pick a `key_size` wide enough for their index range.
pub fn encode_key(idx: usize, key_size: usize) -> Vec<u8> {
    let mut key = vec![0u8; key_size];
    let digits = format!("{idx:0key_size$}");
    let n = digits.len().min(key_size);
    key[..n].copy_from_slice(&digits.as_bytes()[..n]);
    key
}

/// Encode `idx` into a `(key, value)` pair of exactly the configured widths.
///
/// The value carries a `v-` prefix followed by the zero-padded index, with a
/// zero-filled tail when the text is shorter than `value_size`.
pub fn encode_record(idx: usize, key_size: usize, value_size: usize) -> (Vec<u8>, Vec<u8>) {
    let key = encode_key(idx, key_size);
    let width = value_size.saturating_sub(2);
    let value = fit(format!("v-{idx:0width$}"), value_size);
    (key, value)
}

/// Encode the record used by the visibility prober.
///
/// The key is `prefix` plus the unpadded decimal index; the value embeds a
/// nanosecond wall-clock timestamp so every write in a probing run carries a
/// value unique in time.
pub fn probe_record(idx: usize, key_prefix: &str, value_size: usize) -> (Vec<u8>, Vec<u8>) {
    let key = format!("{key_prefix}{idx}").into_bytes();
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let value = fit(format!("v-{idx}-{stamp}"), value_size);
    (key, value)
}

fn fit(text: String, size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    let n = text.len().min(size);
    buf[..n].copy_from_slice(&text.as_bytes()[..n]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_is_zero_padded_to_width() {
        let key = encode_key(42, 8);
        assert_eq!(key, b"00000042");
    }

    #[test]
    fn test_key_always_has_exact_width() {
        for idx in [0, 7, 999, 123_456] {
            assert_eq!(encode_key(idx, 16).len(), 16);
        }
    }

    #[test]
    fn test_key_truncates_oversized_index() {
        // 123456 does not fit in 4 bytes; the leading digits survive.
        let key = encode_key(123_456, 4);
        assert_eq!(key, b"1234");
    }

    #[test]
    fn test_record_widths_and_prefix() {
        let (key, value) = encode_record(17, 16, 100);
        assert_eq!(key.len(), 16);
        assert_eq!(value.len(), 100);
        assert!(value.starts_with(b"v-"));
        assert!(value.ends_with(b"17"));
    }

    #[test]
    fn test_tiny_value_width_does_not_panic() {
        let (_, value) = encode_record(3, 8, 1);
        assert_eq!(value.len(), 1);
        assert_eq!(value[0], b'v');
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode_record(99, 16, 100), encode_record(99, 16, 100));
    }

    #[test]
    fn test_probe_key_is_prefix_plus_index() {
        let (key, value) = probe_record(12, "probe-key-", 100);
        assert_eq!(key, b"probe-key-12");
        assert_eq!(value.len(), 100);
        assert!(value.starts_with(b"v-12-"));
    }

    #[test]
    fn test_probe_values_are_unique_in_time() {
        let (_, a) = probe_record(5, "k-", 64);
        std::thread::sleep(std::time::Duration::from_micros(1));
        let (_, b) = probe_record(5, "k-", 64);
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_keys_injective_in_range(a in 0usize..1_000_000, b in 0usize..1_000_000) {
            prop_assume!(a != b);
            prop_assert_ne!(encode_key(a, 16), encode_key(b, 16));
        }

        #[test]
        fn prop_key_width_is_exact(idx in 0usize..1_000_000, width in 1usize..32) {
            prop_assert_eq!(encode_key(idx, width).len(), width);
        }
    }
}
