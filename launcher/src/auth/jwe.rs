//! JSON Web Encryption (JWE) in compact serialization.
//!
//! Implements the single recipe launch tokens use: the content is encrypted
//! with `A256GCM` under a random content encryption key, and that key is
//! wrapped for the recipient with `RSA-OAEP` (SHA-1, MGF1-SHA-1).
//!
//! Compact form, five base64url segments without padding:
//!
//! ```text
//! header . encrypted_key . iv . ciphertext . tag
//! ```
//!
//! The additional authenticated data is the ASCII of the encoded header
//! (RFC 7516, section 5.1).

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rsa::rand_core::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

/// Key management algorithm identifier.
pub const ALG_RSA_OAEP: &str = "RSA-OAEP";
/// Content encryption algorithm identifier.
pub const ENC_A256GCM: &str = "A256GCM";

const CEK_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Protected header of a JWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    pub alg: String,
    pub enc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

impl JweHeader {
    /// Header for a JWT nested inside a JWE: both `typ` and `cty` are `JWT`.
    #[must_use]
    pub fn nested_jwt() -> Self {
        Self {
            alg: ALG_RSA_OAEP.to_string(),
            enc: ENC_A256GCM.to_string(),
            typ: Some("JWT".to_string()),
            cty: Some("JWT".to_string()),
        }
    }
}

/// Error returned when encrypting or decrypting a JWE fails.
#[derive(Debug)]
pub enum JweError {
    /// The protected header could not be encoded or decoded.
    Header(serde_json::Error),
    /// The content encryption key could not be wrapped or unwrapped.
    KeyWrap(rsa::Error),
    /// AES-GCM encryption failed.
    Encrypt,
    /// AES-GCM decryption failed, or the tag did not verify.
    Decrypt,
    /// The header names an algorithm other than `RSA-OAEP` / `A256GCM`.
    UnsupportedAlgorithm(String),
    /// The compact form does not have the expected shape.
    Malformed(String),
}

impl std::fmt::Display for JweError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header(e) => write!(f, "invalid JWE header: {e}"),
            Self::KeyWrap(e) => write!(f, "content key wrapping failed: {e}"),
            Self::Encrypt => write!(f, "content encryption failed"),
            Self::Decrypt => write!(f, "content decryption failed"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported JWE algorithm: {alg}"),
            Self::Malformed(reason) => write!(f, "malformed JWE: {reason}"),
        }
    }
}

impl std::error::Error for JweError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Header(e) => Some(e),
            Self::KeyWrap(e) => Some(e),
            Self::Encrypt | Self::Decrypt | Self::UnsupportedAlgorithm(_) | Self::Malformed(_) => {
                None
            }
        }
    }
}

/// Encrypts payloads for one recipient.
///
/// A fresh content key and IV are drawn for every call to `encrypt`.
#[derive(Debug, Clone)]
pub struct Encrypter {
    recipient: RsaPublicKey,
    header: JweHeader,
}

impl Encrypter {
    /// Creates an encrypter for `recipient` using `header` as the protected header.
    ///
    /// # Errors
    /// Returns `JweError::UnsupportedAlgorithm` unless the header names
    /// `RSA-OAEP` and `A256GCM`.
    pub fn new(recipient: RsaPublicKey, header: JweHeader) -> Result<Self, JweError> {
        check_algorithms(&header)?;
        Ok(Self { recipient, header })
    }

    /// Encrypts `payload` and returns the compact serialization.
    pub fn encrypt(&self, payload: &[u8]) -> Result<String, JweError> {
        let header_json = serde_json::to_vec(&self.header).map_err(JweError::Header)?;
        let encoded_header = URL_SAFE_NO_PAD.encode(header_json);

        let mut cek = [0u8; CEK_LEN];
        let mut iv = [0u8; IV_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut cek);
        rng.fill_bytes(&mut iv);

        let encrypted_key = self
            .recipient
            .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &cek)
            .map_err(JweError::KeyWrap)?;

        let cipher = Aes256Gcm::new_from_slice(&cek).map_err(|_| JweError::Encrypt)?;
        let mut sealed = cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: payload,
                    aad: encoded_header.as_bytes(),
                },
            )
            .map_err(|_| JweError::Encrypt)?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok([
            encoded_header,
            URL_SAFE_NO_PAD.encode(encrypted_key),
            URL_SAFE_NO_PAD.encode(iv),
            URL_SAFE_NO_PAD.encode(sealed),
            URL_SAFE_NO_PAD.encode(tag),
        ]
        .join("."))
    }
}

/// Decrypts a compact JWE, returning the protected header and the plaintext.
///
/// The launcher never decrypts what it issues; this is the receiving side,
/// used by the tests to open issued tokens and check their contents.
///
/// # Errors
/// Returns a `JweError` if the token is malformed, uses other algorithms, or
/// fails to decrypt under `key`.
pub fn decrypt(token: &str, key: &RsaPrivateKey) -> Result<(JweHeader, Vec<u8>), JweError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [encoded_header, encrypted_key, iv, ciphertext, tag] = segments.as_slice() else {
        return Err(JweError::Malformed(format!(
            "expected 5 segments, found {}",
            segments.len()
        )));
    };

    let header_json = decode_segment("header", encoded_header)?;
    let header: JweHeader = serde_json::from_slice(&header_json).map_err(JweError::Header)?;
    check_algorithms(&header)?;

    let iv = decode_segment("iv", iv)?;
    if iv.len() != IV_LEN {
        return Err(JweError::Malformed(format!("iv must be {IV_LEN} bytes")));
    }
    let tag = decode_segment("tag", tag)?;
    if tag.len() != TAG_LEN {
        return Err(JweError::Malformed(format!("tag must be {TAG_LEN} bytes")));
    }

    let cek = key
        .decrypt(Oaep::new::<Sha1>(), &decode_segment("encrypted key", encrypted_key)?)
        .map_err(JweError::KeyWrap)?;
    let cipher = Aes256Gcm::new_from_slice(&cek).map_err(|_| JweError::Decrypt)?;

    let mut sealed = decode_segment("ciphertext", ciphertext)?;
    sealed.extend_from_slice(&tag);

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &sealed,
                aad: encoded_header.as_bytes(),
            },
        )
        .map_err(|_| JweError::Decrypt)?;

    Ok((header, plaintext))
}

fn check_algorithms(header: &JweHeader) -> Result<(), JweError> {
    if header.alg != ALG_RSA_OAEP {
        return Err(JweError::UnsupportedAlgorithm(header.alg.clone()));
    }
    if header.enc != ENC_A256GCM {
        return Err(JweError::UnsupportedAlgorithm(header.enc.clone()));
    }
    Ok(())
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, JweError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JweError::Malformed(format!("{name} is not base64url: {e}")))
}
