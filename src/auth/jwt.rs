use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::model::role::Role;
use crate::models::{Claims, TokenType};

/// Who a token is issued to.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub employee_id: Option<u64>,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.sub.clone(),
            role: self.role,
            is_admin: self.is_admin,
            employee_id: self.employee_id,
        }
    }
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn claims_for(identity: &Identity, token_type: TokenType, ttl: usize) -> Claims {
    Claims {
        user_id: identity.user_id,
        sub: identity.email.clone(),
        role: identity.role,
        is_admin: identity.is_admin,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id: identity.employee_id,
    }
}

pub fn generate_access_token(identity: &Identity, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = claims_for(identity, TokenType::Access, ttl);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_refresh_token(
    identity: &Identity,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(identity, TokenType::Refresh, ttl);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
