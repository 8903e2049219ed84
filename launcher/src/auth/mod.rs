//! Authentication module.
//!
//! This module issues the signed and encrypted JWTs that launch a survey
//! session.
//!
//! # Pre-conditions
//! - The configured key paths point at a PKCS#1 RSA signing key and a PKIX
//!   RSA encryption key.
//!
//! # Post-conditions
//! - Every issued token is a five-segment compact JWE wrapping a three-segment
//!   compact JWS.
//!
//! # Invariants
//! - No state is retained between calls.

pub mod claims;
pub mod jwe;
pub mod keys;
pub mod token;

pub use claims::{Claims, VariantFlags, generate_claims};
pub use keys::{KeyLoadError, KeyLoadOp, load_encryption_key, load_signing_key};
pub use token::{TokenError, convert_post_to_token, issue_token};
