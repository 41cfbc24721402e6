use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A priced process/location combination.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: u64,
    pub process_id: u64,
    #[schema(example = "Field verification")]
    pub process_name: String,
    #[schema(example = "Pune")]
    pub location: String,
    #[schema(example = 120.0)]
    pub price: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVerification {
    pub process_id: u64,
    #[schema(example = "Pune")]
    pub location: String,
    #[schema(example = 120.0)]
    pub price: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VerificationQuery {
    pub process_id: Option<u64>,
}
