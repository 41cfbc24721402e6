use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Monthly day tally of a fixed-salary employee, with name and identifier
/// joined from the user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "2025-03")]
    pub month: String,
    #[schema(example = "Asha Rao")]
    pub name: String,
    pub identifier: Option<String>,
    #[schema(example = 22)]
    pub working_days: u32,
    #[serde(rename = "leave")]
    #[schema(example = 4)]
    pub leave_days: u32,
    #[schema(example = 4)]
    pub unpaid_leave: u32,
    #[schema(example = 26000.0)]
    pub salary: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendance {
    pub user_id: u64,
    #[schema(example = "2025-03")]
    pub month: String,
    #[schema(example = 22)]
    pub working_days: i32,
    #[schema(example = 4)]
    pub leave: i32,
    #[schema(example = 4)]
    pub unpaid_leave: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendance {
    #[schema(example = 22)]
    pub working_days: i32,
    #[schema(example = 4)]
    pub leave: i32,
    #[schema(example = 4)]
    pub unpaid_leave: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    #[schema(example = "Imported 12 attendance rows for March 2025")]
    pub message: String,
    pub month: String,
    pub imported: usize,
}
