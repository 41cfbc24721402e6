use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cases closed by a person against one verification in a month.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseEntry {
    pub id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    pub verification_id: u64,
    #[schema(example = "Field verification")]
    pub process_name: String,
    #[schema(example = "Pune")]
    pub location: String,
    #[schema(example = 120.0)]
    pub price: f64,
    #[schema(example = 5)]
    pub number_of_cases: u32,
    #[schema(example = "2025-03")]
    pub month: String,
    #[schema(example = 600.0)]
    pub salary: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseEntry {
    #[schema(example = "Asha Rao")]
    pub name: String,
    pub verification_id: u64,
    #[schema(example = 5)]
    pub number_of_cases: u32,
    /// `YYYY-MM` or `March 2025`
    #[schema(example = "2025-03")]
    pub month: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseEntry {
    pub name: Option<String>,
    pub verification_id: Option<u64>,
    pub number_of_cases: Option<u32>,
    pub month: Option<String>,
}
