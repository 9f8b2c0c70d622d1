use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage, ResponseError, error::ErrorInternalServerError, web::Data};
use tracing::debug;

use crate::auth::auth::{AuthUser, access_claims};
use crate::config::Config;

/// Verifies the access token once for the protected scope and stores the
/// caller where the `AuthUser` extractor finds it.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("App config missing"))?;

    match access_claims(req.request(), &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser::from(claims));
            next.call(req).await
        }
        Err(e) => {
            debug!(path = %req.path(), reason = %e, "Unauthenticated request refused");
            Ok(req.into_response(e.error_response()))
        }
    }
}
