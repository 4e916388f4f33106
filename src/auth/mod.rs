mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{SESSION_TTL_HOURS, UserClaims, generate_token, process_token};
mod code;
pub use code::{CODE_ALPHABET, CODE_LENGTH, generate_code, normalize_code};
mod error;
pub use error::{CryptError, CryptResult};
