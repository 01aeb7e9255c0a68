use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::{Role, Team};
use crate::models::TokenType;
use crate::store::CrmStore;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpRequest, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::HeaderMap,
    web::Data,
};

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds the caller from the trusted claim headers (development mode).
fn actor_from_headers(headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let user_id = header_value(headers, "x-userid")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let role: Role = header_value(headers, "x-role")
        .ok_or_else(|| ApiError::unauthorized("Missing X-Role header"))?
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid role"))?;

    if let Some(team) = header_value(headers, "x-team") {
        let team: Team = team
            .parse()
            .map_err(|_| ApiError::unauthorized("Invalid team"))?;
        if team != role.team() {
            return Err(ApiError::unauthorized("X-Team does not match the role's team"));
        }
    }

    Ok(AuthUser {
        user_id: user_id.to_string(),
        name: header_value(headers, "x-username").unwrap_or(user_id).to_string(),
        role,
        team: role.team(),
    })
}

/// Resolves the caller from a bearer access token, or from the claim
/// headers when no token is sent and `trust_claim_headers` is on.
pub fn resolve_actor(req: &HttpRequest, config: &Config) -> Result<AuthUser, ApiError> {
    let header_value = match req.headers().get("Authorization") {
        Some(h) => h
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?,
        None if config.trust_claim_headers => return actor_from_headers(req.headers()),
        None => return Err(ApiError::unauthorized("Missing Authorization header")),
    };

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must start with Bearer"))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::unauthorized("Access token required"));
    }

    // team always follows the role, whatever the token says
    Ok(AuthUser {
        user_id: claims.sub,
        name: claims.name,
        role: claims.role,
        team: claims.role.team(),
    })
}

/// Access tokens outlive a suspension; the stored account status decides.
async fn require_active(actor: AuthUser, store: &dyn CrmStore) -> Result<AuthUser, ApiError> {
    match store.find_user(&actor.user_id).await? {
        Some(user) if user.is_active() => Ok(actor),
        Some(user) => {
            tracing::info!(user_id = %user.id, status = %user.status, "Blocked inactive account");
            Err(ApiError::forbidden("Account is not active"))
        }
        None => Err(ApiError::unauthorized("Unknown account")),
    }
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let store = req
        .app_data::<Data<dyn CrmStore>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Store missing"))?;

    let resolved = match resolve_actor(req.request(), &config) {
        Ok(actor) => require_active(actor, store.get_ref()).await,
        Err(e) => Err(e),
    };

    match resolved {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => {
            let resp = e.error_response();
            Ok(req.into_response(resp))
        }
    }
}
