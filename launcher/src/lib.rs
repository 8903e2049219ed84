// Life of a launch:
// 1. The survey form is POSTed
// 2. Form values become claims (schema name split into eq_id / form_type,
//    fresh jti / tx_id, 10 minute expiry)
// 3. Claims are signed (RS256) with the signing key
// 4. The signed JWT is encrypted (RSA-OAEP + A256GCM) for the survey runner
// 5. The browser is redirected to the survey runner with the token
//
// System components:
//  - Key loading from PEM files
//  - Claims builder
//  - JWS signer and JWE encrypter

pub mod auth;
pub mod config;
pub mod form;
pub mod time;

#[cfg(test)]
mod testing;

pub use auth::{TokenError, convert_post_to_token};
pub use config::{KeyPaths, LauncherConfig};
pub use form::FormValues;
