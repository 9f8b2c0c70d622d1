use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::{Actor, Role};
use crate::models::{Claims, TokenType};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorInternalServerError,
    http::header, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,

    /// Present only if this user owns an employee profile
    pub employee_id: Option<u64>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
            is_admin: claims.is_admin,
            employee_id: claims.employee_id,
        }
    }
}

/// Extracts and verifies the bearer access token of a request.
pub fn access_claims(req: &HttpRequest, secret: &str) -> Result<Claims, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized("Missing Authorization header"))?;
    let token = value
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized(
            "Authorization header must start with Bearer",
        ))?;

    let claims = verify_token(token, secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token"))?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Refresh tokens cannot access the API"));
    }
    Ok(claims)
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(ErrorInternalServerError("Config missing")));
        };

        let user = access_claims(req, &config.jwt_secret)
            .map(AuthUser::from)
            .map_err(actix_web::Error::from);
        ready(user)
    }
}

impl AuthUser {
    /// Resolves the caller into the role-tagged actor the leave desk accepts.
    pub fn actor(&self) -> Result<Actor, AppError> {
        match self.role {
            Role::Hr => Ok(Actor::Hr {
                user_id: self.user_id,
                is_admin: self.is_admin,
            }),
            Role::Employee => {
                let employee_id = self.employee_id.ok_or(AppError::Forbidden {
                    action: "act without an employee profile",
                })?;
                Ok(Actor::Employee {
                    user_id: self.user_id,
                    employee_id,
                })
            }
        }
    }
}
