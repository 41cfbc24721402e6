use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Monthly fixed salary of a user, pro-rated by attendance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixedAmount {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = 30000.0)]
    pub amount: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetFixedAmount {
    pub user_id: u64,
    #[schema(example = 30000.0)]
    pub amount: f64,
}
