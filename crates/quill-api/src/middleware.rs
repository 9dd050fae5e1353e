use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use quill_types::api::Claims;

use crate::error::ApiError;
use crate::policy::Actor;

/// Resolve the caller's identity and attach it as a request extension.
///
/// No Authorization header means an anonymous actor — downstream policy
/// decides what that actor may do. A header that is present but invalid
/// (malformed, bad signature, expired) is rejected outright.
pub async fn attach_actor(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let actor = match req.headers().get(header::AUTHORIZATION) {
        None => Actor::Anonymous,
        Some(auth_header) => {
            let token = auth_header
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthenticated)?;

            let secret = std::env::var("QUILL_JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".into());

            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|_| ApiError::Unauthenticated)?;

            Actor::from_claims(Some(&token_data.claims))
        }
    };

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
