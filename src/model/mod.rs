use serde::Deserialize;
use utoipa::IntoParams;

pub mod attendance;
pub mod collection;
pub mod customer;
pub mod distribution;
pub mod fixed_amount;
pub mod payout;
pub mod process;
pub mod product;
pub mod report;
pub mod role;
pub mod user;
pub mod verification;

/// `?month=` filter shared by the monthly resources. Accepts `YYYY-MM`,
/// a label such as `March 2025`, or `all`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    #[param(example = "2025-03")]
    pub month: Option<String>,
}
