//! Purchase code generation.
//!
//! Codes use an uppercase alphabet without the look-alike glyphs `0/O` and `1/I/L`.

use rand::Rng;

pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 12;

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trims and uppercases a code as typed by a user.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
