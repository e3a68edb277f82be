//! Pirit checksum algorithm
//!
//! The checksum is a single byte: the XOR of every byte after STX up to and
//! including ETX. On the wire it travels as two uppercase ASCII hex digits.

use tracing::trace;

/// Calculate the checksum over the covered bytes
///
/// # Examples
///
/// ```
/// use vikiprint_core::checksum;
///
/// assert_eq!(checksum::calculate(b"PIRI!00\x03"), 0x20);
/// ```
pub fn calculate(covered: &[u8]) -> u8 {
    let checksum = covered.iter().fold(0u8, |acc, b| acc ^ b);

    trace!(
        len = covered.len(),
        checksum = format!("0x{:02X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Render a checksum as the two digits sent on the wire
pub fn to_digits(checksum: u8) -> [u8; 2] {
    let digits = hex::encode_upper([checksum]);
    let digits = digits.as_bytes();
    [digits[0], digits[1]]
}

/// Verify received digits against the covered bytes
///
/// Digits are compared as characters, so lowercase hex is rejected.
pub fn verify(covered: &[u8], received: &[u8]) -> bool {
    received == to_digits(calculate(covered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(calculate(&[]), 0);
    }

    #[test]
    fn test_checksum_is_xor() {
        assert_eq!(calculate(&[0x0F, 0xF0]), 0xFF);
        assert_eq!(calculate(&[0xAA, 0xAA]), 0x00);
    }

    #[test]
    fn test_digits_uppercase() {
        assert_eq!(&to_digits(0x7a), b"7A");
        assert_eq!(&to_digits(0x05), b"05");
    }

    #[test]
    fn test_verify() {
        let covered = b"PIRI!00\x03";
        assert!(verify(covered, b"20"));
        assert!(!verify(covered, b"21"));
        assert!(!verify(covered, b"2"));
    }

    #[test]
    fn test_verify_rejects_lowercase() {
        let covered = [0x7A];
        assert!(verify(&covered, b"7A"));
        assert!(!verify(&covered, b"7a"));
    }
}
