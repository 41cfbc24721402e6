pub mod attendance;
pub mod customers;
pub mod distributions;
pub mod fixed_amount;
pub mod payouts;
pub mod planned_collections;
pub mod processes;
pub mod products;
pub mod received_collections;
pub mod reports;
pub mod users;
pub mod verifications;

use crate::{
    domain::month::{MonthFilter, normalize_month},
    error::ServiceError,
};

/// `?month=` into a filter, 400 on anything that is not a month or `all`.
pub(crate) fn month_filter(raw: Option<&str>) -> Result<MonthFilter, ServiceError> {
    MonthFilter::parse(raw).map_err(ServiceError::BadRequest)
}

/// A month that must name one specific month.
pub(crate) fn required_month(raw: &str) -> Result<String, ServiceError> {
    normalize_month(raw).ok_or_else(|| ServiceError::bad_request(format!("Invalid month: {}", raw.trim())))
}

/// Trimmed text, 400 naming `field` when blank.
pub(crate) fn required_text<'a>(value: &'a str, field: &str) -> Result<&'a str, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::bad_request(format!("{field} is required")));
    }
    Ok(value)
}

pub(crate) fn non_negative(value: f64, field: &str) -> Result<f64, ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::bad_request(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_helpers_reject_garbage() {
        assert_eq!(month_filter(Some("all")).unwrap(), MonthFilter::All);
        assert_eq!(
            month_filter(Some("March 2025")).unwrap(),
            MonthFilter::Month("2025-03".to_string())
        );
        assert!(matches!(month_filter(Some("2025-13")), Err(ServiceError::BadRequest(_))));

        assert_eq!(required_month(" 2025-03 ").unwrap(), "2025-03");
        assert!(required_month("all").is_err());
    }

    #[test]
    fn value_checks() {
        assert_eq!(required_text("  Pune ", "Location").unwrap(), "Pune");
        assert!(required_text("   ", "Location").is_err());

        assert_eq!(non_negative(0.0, "Price").unwrap(), 0.0);
        assert!(non_negative(-0.5, "Price").is_err());
        assert!(non_negative(f64::NAN, "Price").is_err());
    }
}
