use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::role::Role;

/// Full row including the password hash; never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSql {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub is_active: bool,
    pub token_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha")]
    pub username: String,
    #[schema(example = 4)]
    pub role_id: u8,
    #[schema(example = 3, nullable = true)]
    pub supervisor_id: Option<u64>,
    #[schema(example = "EMP-012", nullable = true)]
    pub identifier: Option<String>,
    pub is_active: bool,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha")]
    pub username: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = 4)]
    pub role_id: u8,
    pub supervisor_id: Option<u64>,
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePassword {
    #[schema(example = "n3w-pass")]
    pub password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role_id: Option<u8>,
    /// Matches name, username or identifier
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    pub supervisor_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}
