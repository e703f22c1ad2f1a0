// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// `token_use` claim value for short-lived API tokens.
pub const TOKEN_USE_ACCESS: &str = "access";
/// `token_use` claim value for long-lived refresh tokens.
pub const TOKEN_USE_REFRESH: &str = "refresh";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Whether the subject held admin rights when the token was signed.
    pub is_admin: bool,
    /// Token kind: 'access' or 'refresh'. Only access tokens pass the auth
    /// middleware; only refresh tokens are accepted by the refresh endpoint.
    pub token_use: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// Numeric user id carried in the `sub` claim.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: i64,
    is_admin: bool,
    token_use: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(), // Store User ID in 'sub' claim
        is_admin,
        token_use: token_use.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Extracts the bearer token from an Authorization header value.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// Refresh tokens are rejected here; they are only good for `/auth/refresh`.
/// If valid, injects `Claims` into the request extensions for handlers to use.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let claims = verify_jwt(token, &config.jwt_secret)?;
    if claims.token_use != TOKEN_USE_ACCESS {
        return Err(AppError::AuthError("Access token required".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks the injected `Claims` for the
/// admin flag. The caller is authenticated at this point, so failures are 403.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Missing credentials".to_string()))?;

    require_admin(claims)?;

    Ok(next.run(req).await)
}

/// Guard: the caller must be an admin.
pub fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Guard: the caller must own the resource or be an admin.
pub fn require_owner_or_admin(claims: &Claims, owner_id: i64) -> Result<(), AppError> {
    if claims.is_admin || claims.user_id()? == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to access this resource".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let token = sign_jwt(42, true, TOKEN_USE_ACCESS, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert!(claims.is_admin);
        assert_eq!(claims.token_use, TOKEN_USE_ACCESS);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt(42, false, TOKEN_USE_ACCESS, "secret", 60).unwrap();
        assert!(verify_jwt(&token, "other_secret").is_err());
    }

    #[test]
    fn owner_or_admin_guard() {
        let owner = Claims {
            sub: "1".to_string(),
            is_admin: false,
            token_use: TOKEN_USE_ACCESS.to_string(),
            exp: 0,
        };
        assert!(require_owner_or_admin(&owner, 1).is_ok());
        assert!(matches!(
            require_owner_or_admin(&owner, 2),
            Err(AppError::Forbidden(_))
        ));

        let admin = Claims {
            sub: "9".to_string(),
            is_admin: true,
            token_use: TOKEN_USE_ACCESS.to_string(),
            exp: 0,
        };
        assert!(require_owner_or_admin(&admin, 2).is_ok());
    }
}
