//! Key loading module.
//!
//! Reads the RSA keys used to issue tokens from PEM files.
//!
//! # Pre-conditions
//! - The signing key file holds a PEM block with a PKCS#1 DER RSA private key.
//! - The encryption key file holds a PEM block with a PKIX DER public key whose
//!   algorithm is RSA.
//!
//! # Post-conditions
//! - On success, the returned key is ready for use without further conversion.
//! - On failure, the error names the operation that failed: `read`, `parse`
//!   or `cast`.
//!
//! # Invariants
//! - Keys are read from disk on every call and never cached or logged.

use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePublicKey, SubjectPublicKeyInfoRef};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// The key loading step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLoadOp {
    /// The key file could not be read.
    Read,
    /// The file content is not a PEM-wrapped key of the expected structure.
    Parse,
    /// The key parsed, but is not an RSA key.
    Cast,
}

impl KeyLoadOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Cast => "cast",
        }
    }
}

impl std::fmt::Display for KeyLoadOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a key cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLoadError {
    /// The operation which caused the error.
    pub op: KeyLoadOp,
    /// Description of the error that occurred during the operation.
    pub err: String,
}

impl KeyLoadError {
    fn new(op: KeyLoadOp, err: impl Into<String>) -> Self {
        Self {
            op,
            err: err.into(),
        }
    }
}

impl std::fmt::Display for KeyLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.op, self.err)
    }
}

impl std::error::Error for KeyLoadError {}

/// Loads the RSA private key used to sign tokens.
///
/// # Errors
/// - `read` if the file cannot be read.
/// - `parse` if the content is not PEM or the payload is not a PKCS#1 RSA
///   private key.
pub fn load_signing_key(path: &Path) -> Result<RsaPrivateKey, KeyLoadError> {
    let block = read_pem(path, "signing")?;

    RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| {
        KeyLoadError::new(
            KeyLoadOp::Parse,
            format!("Failed to parse signing key from PEM: {e}"),
        )
    })
}

/// Loads the RSA public key used to encrypt tokens.
///
/// # Errors
/// - `read` if the file cannot be read.
/// - `parse` if the content is not PEM or the payload is not a PKIX public key.
/// - `cast` if the public key is of another algorithm, such as EC.
pub fn load_encryption_key(path: &Path) -> Result<RsaPublicKey, KeyLoadError> {
    let block = read_pem(path, "encryption")?;
    let parse_error = |e: &dyn std::fmt::Display| {
        KeyLoadError::new(
            KeyLoadOp::Parse,
            format!("Failed to parse encryption key PEM: {e}"),
        )
    };

    let spki = SubjectPublicKeyInfoRef::try_from(block.contents()).map_err(|e| parse_error(&e))?;

    if spki.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(KeyLoadError::new(
            KeyLoadOp::Cast,
            format!(
                "Failed to cast key to RSA public key: algorithm is {}",
                spki.algorithm.oid
            ),
        ));
    }

    RsaPublicKey::from_public_key_der(block.contents()).map_err(|e| parse_error(&e))
}

/// Reads `path` and decodes its first PEM block; `what` names the key in errors.
fn read_pem(path: &Path, what: &str) -> Result<pem::Pem, KeyLoadError> {
    let key_data = std::fs::read(path).map_err(|e| {
        KeyLoadError::new(
            KeyLoadOp::Read,
            format!(
                "Failed to read {what} key from file: {} ({e})",
                path.display()
            ),
        )
    })?;

    pem::parse(&key_data).map_err(|e| {
        KeyLoadError::new(
            KeyLoadOp::Parse,
            format!("Failed to decode {what} key PEM in {}: {e}", path.display()),
        )
    })
}
