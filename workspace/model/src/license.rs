//! Driver license number rule.
//!
//! A license number is exactly 8 characters: three uppercase Latin letters
//! followed by five decimal digits. Input is taken as-is; lowercase letters
//! are not folded.

pub const LICENSE_NUMBER_LEN: usize = 8;

/// Check a candidate license number against the format rule.
pub fn is_valid(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != LICENSE_NUMBER_LEN {
        return false;
    }
    bytes[..3].iter().all(u8::is_ascii_uppercase) && bytes[3..].iter().all(u8::is_ascii_digit)
}
