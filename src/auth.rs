use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Claim set wrapping a raw api-key header value.
#[derive(Serialize)]
struct ApiKeyClaims<'a> {
    #[serde(rename = "api-key")]
    api_key: Option<&'a str>,
}

/// Deterministically encode an api-key header value under the configured
/// signing key. The result is what gets stored as a user's `api_token`, so
/// resolving a caller is a plain equality lookup. An absent header encodes
/// a null claim rather than failing; it simply matches no stored token.
pub fn encode_api_key(
    api_key: Option<&str>,
    secret: &str,
    algorithm: Algorithm,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(algorithm),
        &ApiKeyClaims { api_key },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
