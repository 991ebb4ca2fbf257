use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";

/// Hash a password with a fresh random salt.
///
/// Output format: `pbkdf2-sha256$<iterations>$<salt>$<hash>` (base64, no padding).
/// The iteration count travels with the hash so it can be raised later
/// without invalidating stored credentials.
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, PBKDF2_ITERATIONS)
}

pub fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a password against a stored hash in constant time.
///
/// A malformed stored value never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match parse_stored(stored) {
        Ok(parsed) => {
            let candidate = derive(password, &parsed.salt, parsed.iterations);
            candidate[..].ct_eq(&parsed.hash[..]).into()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}

struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: [u8; HASH_LENGTH],
}

fn parse_stored(stored: &str) -> Result<StoredHash, CryptoError> {
    let mut parts = stored.split('$');
    let scheme = parts.next().ok_or(CryptoError::MalformedHash)?;
    if scheme != SCHEME {
        return Err(CryptoError::UnsupportedScheme(scheme.to_string()));
    }
    let iterations: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .ok_or(CryptoError::MalformedHash)?;
    let salt = parts
        .next()
        .and_then(|s| STANDARD_NO_PAD.decode(s).ok())
        .ok_or(CryptoError::MalformedHash)?;
    let hash: [u8; HASH_LENGTH] = parts
        .next()
        .and_then(|s| STANDARD_NO_PAD.decode(s).ok())
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CryptoError::MalformedHash)?;
    if parts.next().is_some() {
        return Err(CryptoError::MalformedHash);
    }
    Ok(StoredHash {
        iterations,
        salt,
        hash,
    })
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
