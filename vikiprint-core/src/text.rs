//! Device text encoding
//!
//! The register speaks CP866 (IBM866). Every byte maps to a character, so
//! decoding never fails; encoding replaces characters outside the code page
//! with `?`.

use encoding_rs::IBM866;

/// Decode device bytes into a string
pub fn decode(bytes: &[u8]) -> String {
    let (text, _) = IBM866.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encode a string for the device
pub fn encode(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = IBM866.encode(text);
    if !had_errors {
        return bytes.into_owned();
    }

    // encoding_rs substitutes numeric character references; the register
    // would print those verbatim.
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (bytes, _, had_errors) = IBM866.encode(ch.encode_utf8(&mut buf));
        if had_errors {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}
