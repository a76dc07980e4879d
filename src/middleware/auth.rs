use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// The caller as established by the identity collaborator. `sub` carries the
/// learner id as a decimal string; tokens with a non-numeric subject are
/// treated as anonymous.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .ok()?;

    let user_id = data.claims.sub.parse::<i32>().ok()?;
    Some(Identity {
        user_id,
        role: data.claims.role.unwrap_or_else(|| "student".to_string()),
    })
}

/// Attaches the caller's identity when a valid token is present and carries
/// on anonymously otherwise. Read endpoints use this: no identity simply
/// means no personalized enrichment.
pub async fn attach_identity(mut req: Request, next: Next) -> Response {
    if let Some(identity) = identity_from_headers(req.headers()) {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

/// Rejects anonymous callers. Submitting answers or files needs a learner
/// to attribute them to.
pub async fn require_identity(mut req: Request, next: Next) -> Response {
    match identity_from_headers(req.headers()) {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_token"})),
        )
            .into_response(),
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match identity_from_headers(req.headers()) {
        Some(identity) if identity.is_admin() => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Some(_) => (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"}))).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_token"})),
        )
            .into_response(),
    }
}
