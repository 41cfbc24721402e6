//! Business rules that do not touch the database.

pub mod attendance;
pub mod collection;
pub mod incentive;
pub mod month;
pub mod payout;

/// Round a money amount to paise.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
