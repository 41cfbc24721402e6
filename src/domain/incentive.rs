use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supervisor's cut of a distribution; the rest is the team pool.
pub const SUPERVISOR_SHARE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveSplit {
    #[schema(example = 10000.0)]
    pub incentive: f64,
    #[schema(example = 6000.0)]
    pub supervisor_incentive: f64,
    #[schema(example = 4000.0)]
    pub team_incentive_pool: f64,
    #[schema(example = 1333.33)]
    pub individual_team_incentive: f64,
    pub member_count: usize,
    /// No team members were assigned; the pool is held rather than paid out
    pub pool_unassigned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum IncentiveError {
    #[display(fmt = "Incentive must be a finite number")]
    NotFinite,

    #[display(fmt = "Incentive cannot be negative (got {})", _0)]
    Negative(f64),
}

/// Split an incentive 60/40 between the supervisor and the team.
///
/// The per-member share divides by `max(1, member_count)`, so with no members
/// the whole pool shows up as one share and `pool_unassigned` is set.
pub fn split_incentive(amount: f64, member_count: usize) -> Result<IncentiveSplit, IncentiveError> {
    if !amount.is_finite() {
        return Err(IncentiveError::NotFinite);
    }
    if amount < 0.0 {
        return Err(IncentiveError::Negative(amount));
    }

    let supervisor_incentive = amount * SUPERVISOR_SHARE;
    let team_incentive_pool = amount - supervisor_incentive;
    let individual_team_incentive = team_incentive_pool / member_count.max(1) as f64;

    Ok(IncentiveSplit {
        incentive: amount,
        supervisor_incentive,
        team_incentive_pool,
        individual_team_incentive,
        member_count,
        pool_unassigned: member_count == 0 && team_incentive_pool > 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn splits_sixty_forty() {
        let split = split_incentive(10_000.0, 3).unwrap();

        assert!((split.supervisor_incentive - 6_000.0).abs() < EPS);
        assert!((split.team_incentive_pool - 4_000.0).abs() < EPS);
        assert!((split.individual_team_incentive - 4_000.0 / 3.0).abs() < EPS);
        assert!(!split.pool_unassigned);
    }

    #[test]
    fn shares_always_add_back_up() {
        for amount in [0.0, 0.01, 1.0, 333.33, 10_000.0, 1_234_567.89] {
            for members in 0..6 {
                let split = split_incentive(amount, members).unwrap();
                let sum = split.supervisor_incentive + split.team_incentive_pool;
                assert!((sum - amount).abs() < EPS, "{amount} with {members}");

                let expected = split.team_incentive_pool / members.max(1) as f64;
                assert!((split.individual_team_incentive - expected).abs() < EPS);
            }
        }
    }

    #[test]
    fn empty_team_flags_the_pool() {
        let split = split_incentive(5_000.0, 0).unwrap();

        assert!(split.pool_unassigned);
        assert!((split.individual_team_incentive - 2_000.0).abs() < EPS);

        let zero = split_incentive(0.0, 0).unwrap();
        assert!(!zero.pool_unassigned);
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert_eq!(split_incentive(-1.0, 2), Err(IncentiveError::Negative(-1.0)));
        assert_eq!(split_incentive(f64::NAN, 2), Err(IncentiveError::NotFinite));
        assert_eq!(
            IncentiveError::Negative(-5.0).to_string(),
            "Incentive cannot be negative (got -5)"
        );
    }
}
