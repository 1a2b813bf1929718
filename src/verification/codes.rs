//! Session and lookup code generation.

use rand::Rng;

/// Length of both the numeric session code and the alphanumeric lookup code.
pub const CODE_LEN: usize = 6;

const SESSION_CODE_MIN: u32 = 100_000;
const SESSION_CODE_MAX: u32 = 999_999;

const LOOKUP_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
// 36^6, the number of distinct lookup codes.
const LOOKUP_SPACE: u64 = 2_176_782_336;

/// Source of the codes a flow hands out.
pub trait CodeSource: Send + Sync {
    /// Six-digit numeric one-time code sent to the contact.
    fn session_code(&self) -> String;
    /// Six-character upper-case base-36 code identifying a stored record.
    fn lookup_code(&self) -> String;
}

/// Codes drawn from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn session_code(&self) -> String {
        issue_session_code(&mut rand::thread_rng())
    }

    fn lookup_code(&self) -> String {
        issue_lookup_code(&mut rand::thread_rng())
    }
}

/// Uniform integer in `[100000, 999999]` as a string.
pub fn issue_session_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(SESSION_CODE_MIN..=SESSION_CODE_MAX).to_string()
}

/// A random fraction of the lookup space written as six base-36 digits.
///
/// No uniqueness check is made against records already issued.
pub fn issue_lookup_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut value = rng.gen_range(0..LOOKUP_SPACE);
    let mut digits = [b'0'; CODE_LEN];
    for slot in digits.iter_mut().rev() {
        let index = usize::try_from(value % 36).unwrap_or(0);
        *slot = LOOKUP_ALPHABET[index];
        value /= 36;
    }
    digits.iter().map(|&b| char::from(b)).collect()
}

/// Upper-case a user supplied lookup code before comparing it.
#[must_use]
pub fn normalize_lookup_code(code: &str) -> String {
    code.to_uppercase()
}
