use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{
    role::{Role, Team},
    user::User,
};

#[derive(Deserialize, ToSchema)]
pub struct SignupReq {
    #[schema(example = "Arjun Mehta")]
    pub name: String,
    #[schema(example = "arjun@connectasetu.com", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "9111111111")]
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@connectasetu.com", format = "email")]
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: Team,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
