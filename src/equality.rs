// Null-safe equality and hash helpers
// Shared by the three card fields and the bank card track record.
//
// Hash codes here are plain u32 accumulators (prime 31, seed 1) so they are
// stable across runs and processes, unlike RandomState.

/// Prime multiplier for hash accumulation
pub const HASH_PRIME: u32 = 31;

/// Seed for hash accumulation
pub const HASH_SEED: u32 = 1;

/// Equal iff both sides are absent, or both are present and equal.
pub fn optional_equals<T: PartialEq + ?Sized>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Hash code of an optional value; absent contributes 0.
pub fn optional_hash_code<T, F>(value: Option<&T>, hash: F) -> u32
where
    T: ?Sized,
    F: Fn(&T) -> u32,
{
    value.map(hash).unwrap_or(0)
}

/// Polynomial string hash (`s[0]*31^(n-1) + ... + s[n-1]`) over chars.
pub fn string_hash_code(s: &str) -> u32 {
    s.chars()
        .fold(0u32, |acc, c| acc.wrapping_mul(HASH_PRIME).wrapping_add(c as u32))
}

/// Combine hash codes in order: `result = 31 * result + code`, starting at 1.
///
/// Order matters; callers must pass codes in a fixed order.
pub fn combine_hash_codes(codes: &[u32]) -> u32 {
    codes.iter().fold(HASH_SEED, |acc, code| {
        acc.wrapping_mul(HASH_PRIME).wrapping_add(*code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_equals() {
        assert!(optional_equals::<str>(None, None));
        assert!(optional_equals(Some("4111"), Some("4111")));
        assert!(!optional_equals(Some("4111"), Some("4000")));
        assert!(!optional_equals(Some("4111"), None));
        assert!(!optional_equals(None, Some("4111")));
    }

    #[test]
    fn test_optional_hash_code_sentinel() {
        assert_eq!(optional_hash_code::<str, _>(None, string_hash_code), 0);
        assert_eq!(
            optional_hash_code(Some("101"), string_hash_code),
            string_hash_code("101")
        );
    }

    #[test]
    fn test_string_hash_code_known_values() {
        assert_eq!(string_hash_code(""), 0);
        // '1' = 49, '0' = 48: ((49 * 31) + 48) * 31 + 49
        assert_eq!(string_hash_code("101"), 48_626);
    }

    #[test]
    fn test_combine_hash_codes_is_order_sensitive() {
        assert_eq!(combine_hash_codes(&[]), 1);
        assert_eq!(combine_hash_codes(&[0, 0, 0]), 29_791);
        assert_ne!(combine_hash_codes(&[1, 2, 3]), combine_hash_codes(&[3, 2, 1]));
    }
}
