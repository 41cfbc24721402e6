use crate::domain::round2;

/// Payout for a case entry: cases times the verification price.
pub fn case_salary(number_of_cases: u32, price: f64) -> f64 {
    round2(f64::from(number_of_cases) * price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_is_cases_times_price() {
        assert_eq!(case_salary(5, 120.0), 600.0);
        assert_eq!(case_salary(0, 120.0), 0.0);
        assert_eq!(case_salary(3, 12.5), 37.5);
    }
}
