//! Survey launch claims.
//!
//! Builds the claim set carried inside a launch token from submitted form
//! values plus generated fields.
//!
//! # Post-conditions
//! - `exp` is always `iat` + 10 minutes.
//! - `jti` and `tx_id` are fresh, independent v4 UUIDs.
//! - `eq_id` and `form_type` are either both set or both empty.
//!
//! # Invariants
//! - Building claims never fails. Missing fields become empty strings and a
//!   schema name that does not match the pattern leaves both derived fields
//!   empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::FormValues;
use crate::time::TimeSource;

/// Lifetime of an issued token, in seconds.
pub const TOKEN_LIFETIME_SECS: u64 = 10 * 60;

#[allow(clippy::expect_used)] // The pattern is a literal; failure is a programming error.
static SCHEMA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<eq_id>[a-z0-9]+)_(?P<form_type>[0-9A-Za-z_]+)\.json")
        .expect("schema pattern is valid")
});

/// Free-text variant metadata grouped under `variant_flags`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFlags {
    pub sexual_identity: String,
}

/// Claims carried inside a launch token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Unique token identifier.
    pub jti: String,
    pub user_id: String,
    pub eq_id: String,
    pub period_id: String,
    pub period_str: String,
    pub collection_exercise_sid: String,
    pub ru_ref: String,
    pub ru_name: String,
    /// ISO 8601 date.
    pub ref_p_start_date: String,
    /// ISO 8601 date.
    pub ref_p_end_date: String,
    pub form_type: String,
    pub return_by: String,
    pub trad_as: String,
    /// ISO 8601 date.
    pub employment_date: String,
    pub region_code: String,
    pub language_code: String,
    pub variant_flags: VariantFlags,
    pub roles: String,
    /// Transaction identifier, independent of `jti`.
    pub tx_id: String,
}

/// Splits a schema file name such as `1_0005.json` into `(eq_id, form_type)`.
///
/// Returns two empty strings when the name does not match.
#[must_use]
pub fn extract_eq_id_form_type(schema: &str) -> (String, String) {
    SCHEMA_PATTERN
        .captures(schema)
        .map_or_else(Default::default, |caps| {
            (
                caps["eq_id"].to_string(),
                caps["form_type"].to_string(),
            )
        })
}

/// Builds the claims for a form submission.
#[must_use]
pub fn generate_claims(values: &FormValues, clock: &impl TimeSource) -> Claims {
    let issued = clock.now_secs();
    let expires = issued + TOKEN_LIFETIME_SECS;

    let (eq_id, form_type) = extract_eq_id_form_type(values.get("schema"));
    let field = |name: &str| values.get(name).to_string();

    Claims {
        iat: issued,
        exp: expires,
        jti: Uuid::new_v4().to_string(),
        user_id: field("user_id"),
        eq_id,
        period_id: field("period_id"),
        period_str: field("period_str"),
        collection_exercise_sid: field("collection_exercise_sid"),
        ru_ref: field("ru_ref"),
        ru_name: field("ru_name"),
        ref_p_start_date: field("ref_p_start_date"),
        ref_p_end_date: field("ref_p_end_date"),
        form_type,
        return_by: field("return_by"),
        trad_as: field("trad_as"),
        employment_date: field("employment_date"),
        region_code: field("region_code"),
        language_code: field("language_code"),
        variant_flags: VariantFlags {
            sexual_identity: field("sexual_identity"),
        },
        roles: field("roles"),
        tx_id: Uuid::new_v4().to_string(),
    }
}
