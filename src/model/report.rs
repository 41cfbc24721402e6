use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::collection::{Achievement, CollectionSummary};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    /// `YYYY-MM`, or `all`
    pub month: String,
    pub rows: Vec<CollectionSummary>,
    pub total_planned_money: f64,
    pub total_received_money: f64,
    #[schema(value_type = Object, example = 90.0)]
    pub achievement: Achievement,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: String,
    pub total_planned_money: f64,
    pub total_received_money: f64,
    #[schema(value_type = Object, example = 90.0)]
    pub achievement: Achievement,
    pub distribution_count: usize,
    pub supervisor_incentive_total: f64,
    pub team_incentive_total: f64,
    /// Distributions whose team pool has nobody to go to
    pub unassigned_pool_count: usize,
    pub case_count: u64,
    pub payout_salary_total: f64,
    pub attendance_count: usize,
    pub fixed_salary_total: f64,
}
