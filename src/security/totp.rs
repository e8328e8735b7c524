/// Time-based one-time codes (TOTP, SHA-1, 30-second step)
use base32::Alphabet;
use rand::Rng;
use totp_lite::{totp_custom, Sha1};

pub const STEP_SECONDS: u64 = 30;
pub const CODE_DIGITS: u32 = 6;
const SECRET_LEN: usize = 20;

/// Generate a fresh random shared secret.
pub fn generate_secret() -> Vec<u8> {
    let mut secret = [0u8; SECRET_LEN];
    rand::thread_rng().fill(&mut secret[..]);
    secret.to_vec()
}

/// RFC 4648 base32 without padding, the encoding authenticator apps expect.
pub fn secret_to_base32(secret: &[u8]) -> String {
    base32::encode(Alphabet::Rfc4648 { padding: false }, secret)
}

/// otpauth URI for provisioning an authenticator app.
pub fn provisioning_uri(email: &str, secret: &[u8]) -> String {
    format!(
        "otpauth://totp/Quill:{}?secret={}&issuer=Quill",
        urlencoding::encode(email),
        secret_to_base32(secret)
    )
}

/// Verify a code against the current time step, tolerating one step of clock
/// skew on either side.
pub fn verify_code(secret: &[u8], code: &str) -> bool {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    verify_code_at(secret, code, now)
}

/// Verification with an explicit clock, shared by `verify_code` and tests.
pub fn verify_code_at(secret: &[u8], code: &str, unix_time: u64) -> bool {
    if code.len() != CODE_DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let current_step = unix_time / STEP_SECONDS;
    // current step and the immediately adjacent ones
    for step in current_step.saturating_sub(1)..=current_step + 1 {
        let expected = totp_custom::<Sha1>(STEP_SECONDS, CODE_DIGITS, secret, step * STEP_SECONDS);
        if expected == code {
            return true;
        }
    }
    false
}

/// The code for a given instant; used to surface the expected value in tests.
pub fn code_at(secret: &[u8], unix_time: u64) -> String {
    totp_custom::<Sha1>(STEP_SECONDS, CODE_DIGITS, secret, unix_time)
}
