use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCollection {
    pub id: u64,
    #[schema(example = "2025-03")]
    pub month: String,
    #[schema(example = "Ravi Kumar")]
    pub supervisor_name: String,
    #[schema(example = "Acme Bank - Home Loans")]
    pub product_key: String,
    #[schema(example = 40)]
    pub num_cases: u32,
    pub pos: f64,
    pub basic: f64,
    #[schema(example = 50000.0)]
    pub money_collection: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCollectionInput {
    #[schema(example = "2025-03")]
    pub month: String,
    pub supervisor_name: String,
    pub product_key: String,
    #[serde(default)]
    pub num_cases: u32,
    #[serde(default)]
    pub pos: f64,
    #[serde(default)]
    pub basic: f64,
    pub money_collection: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedCollection {
    pub id: u64,
    #[schema(example = "2025-03")]
    pub month: String,
    #[schema(example = "Acme Bank - Home Loans")]
    pub process_key: String,
    pub bill_amount: f64,
    pub tds: f64,
    pub balance: f64,
    pub rate: f64,
    pub gross_salary: f64,
    pub net_salary: f64,
    #[schema(example = 45000.0)]
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedCollectionInput {
    #[schema(example = "2025-03")]
    pub month: String,
    pub process_key: String,
    #[serde(default)]
    pub bill_amount: f64,
    #[serde(default)]
    pub tds: f64,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub gross_salary: f64,
    #[serde(default)]
    pub net_salary: f64,
    pub total: f64,
}
