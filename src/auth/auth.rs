use crate::{error::ApiError, model::role::{Role, Team}};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The caller, as resolved by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub team: Team,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ApiError::unauthorized("Authentication required"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("This role has no access to admin operations"))
        }
    }

    pub fn require_employee(&self) -> Result<(), ApiError> {
        if self.role.is_employee() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only employees can perform this action"))
        }
    }
}
