//! Bearer tokens and the login/registration endpoints.

use api_types::auth::{Login, Register, Session};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use engine::{EngineError, Principal, RegisterCmd, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views::account_view};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account id.
    sub: String,
    role: String,
    exp: i64,
    iat: i64,
}

/// Issues and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.account_id.to_string(),
            role: principal.role.as_str().to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ServerError::Engine(EngineError::Internal(format!("token signing: {err}"))))
    }

    /// `None` for anything but a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|err| tracing::debug!("rejected bearer token: {err}"))
            .ok()?;
        let account_id = Uuid::parse_str(&data.claims.sub).ok()?;
        let role = Role::try_from(data.claims.role.as_str()).ok()?;
        Some(Principal::new(account_id, role))
    }
}

/// Handle login requests
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Session>, ServerError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "email and password are required".to_string(),
        ));
    }

    let account = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?;
    let token = state.tokens.issue(&account.principal())?;
    tracing::info!("account {} logged in", account.id);

    Ok(Json(Session {
        token,
        account: account_view(account),
    }))
}

/// Handle registrations with an invite
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<Session>), ServerError> {
    let account = state
        .engine
        .register(RegisterCmd {
            email: payload.email,
            token: payload.token,
            temp_password: payload.temp_password,
            new_password: payload.new_password,
            name: payload.name,
        })
        .await?;
    let token = state.tokens.issue(&account.principal())?;

    Ok((
        StatusCode::CREATED,
        Json(Session {
            token,
            account: account_view(account),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_the_same_principal() {
        let signer = TokenSigner::new("secret", Duration::days(7));
        let principal = Principal::new(Uuid::new_v4(), Role::Admin);

        let token = signer.issue(&principal).ok().unwrap();
        assert_eq!(signer.verify(&token), Some(principal));
    }

    #[test]
    fn foreign_or_expired_tokens_are_rejected() {
        let principal = Principal::new(Uuid::new_v4(), Role::User);
        let token = TokenSigner::new("other", Duration::days(7))
            .issue(&principal)
            .ok()
            .unwrap();
        let signer = TokenSigner::new("secret", Duration::days(7));
        assert_eq!(signer.verify(&token), None);
        assert_eq!(signer.verify("not-a-token"), None);

        let stale = TokenSigner::new("secret", Duration::hours(-2))
            .issue(&principal)
            .ok()
            .unwrap();
        assert_eq!(signer.verify(&stale), None);
    }
}
