use crate::{db::DbPool, errors::ServiceError, events::EventSender, metrics};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, warn};
use validator::ValidationError;

pub mod goodsreceipts;
pub mod purchaseorders;

/// Command trait for implementing the Command Pattern
///
/// Each workflow operation is a command object that validates its input,
/// runs in one database transaction and publishes events once committed.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

/// Quantities and prices may not go below zero.
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Largest magnitude a `decimal(10, 2)` column holds, exclusive.
const AMOUNT_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
const AMOUNT_SCALE: u32 = 2;

/// Quantity or unit price: non-negative and storable as `decimal(10, 2)`
/// without rounding.
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    if value.normalize().scale() > AMOUNT_SCALE {
        let mut err = ValidationError::new("decimal_places");
        err.message = Some("must have at most 2 decimal places".into());
        return Err(err);
    }
    if value.abs() >= AMOUNT_LIMIT {
        let mut err = ValidationError::new("max_digits");
        err.message = Some("must have at most 10 digits in total".into());
        return Err(err);
    }
    Ok(())
}

/// Records the outcome of a command in metrics and logs rejections.
pub(crate) fn observe<T>(
    operation: &'static str,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    match &result {
        Ok(_) => metrics::record_success(operation),
        Err(e) => {
            if e.is_user_facing() {
                warn!(operation, kind = e.kind(), "Workflow operation rejected: {}", e);
            } else {
                error!(operation, kind = e.kind(), "Workflow operation failed: {}", e);
            }
            metrics::record_rejection(operation, e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test]
    fn non_negative_accepts_zero_and_positive() {
        assert!(validate_non_negative(&dec!(0)).is_ok());
        assert!(validate_non_negative(&dec!(-0.00)).is_ok());
        assert!(validate_non_negative(&dec!(12.5)).is_ok());
    }

    #[test]
    fn non_negative_rejects_negative() {
        let err = validate_non_negative(&dec!(-0.01)).unwrap_err();
        assert_eq!(err.code, "non_negative");
    }

    #[test_case(dec!(0) ; "zero")]
    #[test_case(dec!(1.5) ; "one decimal")]
    #[test_case(dec!(1.500) ; "trailing zeros")]
    #[test_case(dec!(99999999.99) ; "largest")]
    fn amount_accepts_decimal_10_2(value: Decimal) {
        assert!(validate_amount(&value).is_ok());
    }

    #[test_case(dec!(1.005), "decimal_places" ; "three decimals")]
    #[test_case(dec!(100000000), "max_digits" ; "nine integer digits")]
    #[test_case(dec!(123456789012.5), "max_digits" ; "far too large")]
    #[test_case(dec!(-1), "non_negative" ; "negative")]
    fn amount_rejects_unstorable_values(value: Decimal, code: &str) {
        let err = validate_amount(&value).unwrap_err();
        assert_eq!(err.code, code);
    }
}
