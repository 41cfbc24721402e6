use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::incentive::{IncentiveError, IncentiveSplit, split_incentive};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DistributionRow {
    pub id: u64,
    pub month: String,
    pub supervisor_id: u64,
    pub supervisor_name: String,
    pub product_key: String,
    pub money_collection: f64,
    pub incentive_received: Option<f64>,
    pub employee_incentive: f64,
}

impl DistributionRow {
    /// `incentive_received` when recorded, otherwise the money collected.
    pub fn incentive_base(&self) -> f64 {
        self.incentive_received.unwrap_or(self.money_collection)
    }
}

/// Distribution with its team and the split computed at read time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub id: u64,
    #[schema(example = "2025-03")]
    pub month: String,
    pub supervisor_id: u64,
    pub supervisor_name: String,
    pub team_member_ids: Vec<u64>,
    pub product_key: String,
    pub money_collection: f64,
    pub incentive_received: Option<f64>,
    pub employee_incentive: f64,
    pub incentive: IncentiveSplit,
}

impl Distribution {
    pub fn assemble(row: DistributionRow, team_member_ids: Vec<u64>) -> Result<Self, IncentiveError> {
        let incentive = split_incentive(row.incentive_base(), team_member_ids.len())?;

        Ok(Self {
            id: row.id,
            month: row.month,
            supervisor_id: row.supervisor_id,
            supervisor_name: row.supervisor_name,
            team_member_ids,
            product_key: row.product_key,
            money_collection: row.money_collection,
            incentive_received: row.incentive_received,
            employee_incentive: row.employee_incentive,
            incentive,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionInput {
    #[schema(example = "2025-03")]
    pub month: String,
    pub supervisor_id: u64,
    #[serde(default)]
    pub team_member_ids: Vec<u64>,
    pub product_key: String,
    pub money_collection: f64,
    pub incentive_received: Option<f64>,
    #[serde(default)]
    pub employee_incentive: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DistributionQuery {
    #[param(example = "2025-03")]
    pub month: Option<String>,
    pub supervisor_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(incentive_received: Option<f64>) -> DistributionRow {
        DistributionRow {
            id: 1,
            month: "2025-03".to_string(),
            supervisor_id: 3,
            supervisor_name: "Ravi".to_string(),
            product_key: "Acme - Loans".to_string(),
            money_collection: 20_000.0,
            incentive_received,
            employee_incentive: 0.0,
        }
    }

    #[test]
    fn split_uses_incentive_received_when_present() {
        let d = Distribution::assemble(row(Some(10_000.0)), vec![4, 5, 6]).unwrap();
        assert!((d.incentive.supervisor_incentive - 6_000.0).abs() < 1e-9);
        assert_eq!(d.incentive.member_count, 3);
    }

    #[test]
    fn split_falls_back_to_money_collection() {
        let d = Distribution::assemble(row(None), vec![]).unwrap();
        assert!((d.incentive.supervisor_incentive - 12_000.0).abs() < 1e-9);
        assert!(d.incentive.pool_unassigned);
    }

    #[test]
    fn negative_stored_values_are_rejected() {
        assert!(Distribution::assemble(row(Some(-1.0)), vec![4]).is_err());
    }
}
