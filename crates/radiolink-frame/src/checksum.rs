//! Additive modulo checksum over a fixed-size record.

/// Default checksum divisor used by stations.
pub const DEFAULT_DIVISOR: u8 = 16;

/// Sum every byte and fold the sum into one byte with `divisor`.
///
/// A zero divisor is treated as 256, i.e. the low byte of the sum.
pub fn compute(bytes: &[u8], divisor: u8) -> u8 {
    let sum: u64 = bytes.iter().map(|&b| u64::from(b)).sum();
    let modulus = match divisor {
        0 => 256,
        d => u64::from(d),
    };
    (sum % modulus) as u8
}

/// Recompute the checksum of `bytes` and compare it to `expected`.
pub fn verify(bytes: &[u8], divisor: u8, expected: u8) -> bool {
    compute(bytes, divisor) == expected
}
