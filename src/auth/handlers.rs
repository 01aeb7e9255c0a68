use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    model::user::{User, UserStatus},
    models::{LoginReqDto, LoginResponse, SignupReq, TokenPair, TokenType},
    store::CrmStore,
    utils::{email_cache, email_filter},
};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, store: &dyn CrmStore) -> Result<bool, ApiError> {
    let email = email.trim().to_lowercase();

    // 1️⃣ Cuckoo filter: fast negative
    if !email_filter::might_exist(&email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if email_cache::is_taken(&email).await {
        return Ok(false);
    }

    // 3️⃣ Store fallback
    if store.find_user_by_email(&email).await?.is_some() {
        email_cache::mark_taken(&email).await;
        return Ok(false);
    }

    Ok(true)
}

/// Issues an access/refresh pair and records the refresh token's id.
async fn issue_tokens(user: &User, store: &dyn CrmStore, config: &Config) -> Result<TokenPair, ApiError> {
    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            ApiError::internal()
        })?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl).map_err(|e| {
            error!(error = %e, "Failed to sign refresh token");
            ApiError::internal()
        })?;

    let expires_at =
        DateTime::<Utc>::from_timestamp(refresh_claims.exp as i64, 0).ok_or_else(ApiError::internal)?;

    debug!(user_id = %user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store
        .insert_refresh_token(&refresh_claims.jti, &user.id, expires_at)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// User signup. New accounts wait in `PENDING` until an admin activates them.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupReq,
    responses(
        (status = 201, description = "Account created, pending approval", body = Object, example = json!({
            "message": "Registration received, awaiting admin approval",
            "status": "PENDING"
        })),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_signup", skip(body, store), fields(email = %body.email))]
pub async fn signup(
    body: web::Json<SignupReq>,
    store: web::Data<dyn CrmStore>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Name, email and password must not be empty"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    if !is_email_available(&email, store.get_ref()).await? {
        info!("Signup rejected: email taken");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hashed = hash_password(&body.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::internal()
    })?;

    let mut user = User::new(name.to_string(), email.clone(), hashed, body.role, UserStatus::Pending);
    user.phone = body.phone.filter(|p| !p.trim().is_empty());

    store.insert_user(&user).await?;

    // if insert succeeded, keep filter and cache populated
    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    info!(user_id = %user.id, role = %user.role, "Signup stored as pending");

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration received, awaiting admin approval",
        "status": UserStatus::Pending
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account pending approval or suspended")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<dyn CrmStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if body.email.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::bad_request("Email and password required"));
    }

    // 2️⃣ Fetch user
    let user = match store.find_user_by_email(body.email.trim()).await? {
        Some(user) => {
            debug!(user_id = %user.id, "User found");
            user
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&body.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    // 4️⃣ Account state
    match user.status {
        UserStatus::Active => {}
        UserStatus::Pending => {
            info!("Login blocked: account pending");
            return Err(ApiError::forbidden("Account is awaiting admin approval"));
        }
        UserStatus::Suspended => {
            info!("Login blocked: account suspended");
            return Err(ApiError::forbidden("Account is suspended"));
        }
    }

    // 5️⃣ Tokens
    let tokens = issue_tokens(&user, store.get_ref(), &config).await?;

    info!(user_id = %user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Refresh token missing, revoked or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn CrmStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req).ok_or_else(|| ApiError::unauthorized("No token"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::unauthorized("Refresh token required"));
    }

    // 🔥 revoke old refresh token; a second use gets nothing back
    let owner = store.consume_refresh_token(&claims.jti).await?;
    if owner.as_deref() != Some(claims.sub.as_str()) {
        info!(jti = %claims.jti, "Refresh token unknown or already used");
        return Err(ApiError::unauthorized("Refresh token revoked"));
    }

    // role or status may have changed since the token was issued
    let user = store
        .find_user(&claims.sub)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| ApiError::unauthorized("Account is not active"))?;

    let tokens = issue_tokens(&user, store.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Refresh token revoked (always succeeds)")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn CrmStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can logout
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The caller's account", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No account behind these credentials")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, store: web::Data<dyn CrmStore>) -> Result<HttpResponse, ApiError> {
    let user = store
        .find_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(HttpResponse::Ok().json(user))
}
