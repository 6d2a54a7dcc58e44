use axum::http::{HeaderMap, StatusCode, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use gallery_types::OwnerScope;
use gallery_types::api::Claims;

/// Extract and validate the bearer JWT. The `sub` claim is the caller's scope.
pub fn extract_claims(headers: &HeaderMap, jwt_secret: &str) -> Result<Claims, StatusCode> {
    let token = bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    decode_claims(token, jwt_secret)
}

/// Like [`extract_claims`], falling back to a `?token=` query value when no
/// bearer header is sent.
pub fn extract_view_claims(
    headers: &HeaderMap,
    query_token: Option<&str>,
    jwt_secret: &str,
) -> Result<Claims, StatusCode> {
    let token = bearer_token(headers)
        .or(query_token)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    decode_claims(token, jwt_secret)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

fn decode_claims(token: &str, jwt_secret: &str) -> Result<Claims, StatusCode> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    if token_data.claims.scope().is_blank() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(token_data.claims)
}

/// Sign a token for `scope`, valid for `ttl_secs`.
pub fn issue_token(
    jwt_secret: &str,
    scope: &OwnerScope,
    ttl_secs: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp() as usize;
    let claims = Claims {
        sub: scope.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
}
