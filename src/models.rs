use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "asha")]
    pub username: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

/// Login payload. The client persists it as its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    #[schema(example = 4)]
    pub role_id: u8,
    #[schema(example = 12)]
    pub user_id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha")]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
    /// `users.token_version` at issue time; bumping it logs the user out
    pub ver: u32,
}
