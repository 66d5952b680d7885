//! Custom Test Assertions
//!
//! Assertion helpers for workflow results that print the offending error
//! or value instead of a bare `assertion failed`.

use std::fmt::Debug;

use app_workflow::{ErrorKind, WorkflowError};
use core_kernel::Money;
use rust_decimal::Decimal;

/// Asserts that `result` failed with an error of `kind`
///
/// # Panics
///
/// Panics if the result is `Ok` or the error has another kind
pub fn assert_kind<T: Debug>(result: Result<T, WorkflowError>, kind: ErrorKind) -> WorkflowError {
    match result {
        Ok(value) => panic!("expected {:?} error, got Ok({:?})", kind, value),
        Err(err) => {
            assert_eq!(err.kind(), kind, "unexpected error: {}", err);
            err
        }
    }
}

/// Asserts that `result` is an invalid transition between the given states
pub fn assert_invalid_transition<T: Debug>(result: Result<T, WorkflowError>, from: &str, to: &str) {
    match assert_kind(result, ErrorKind::InvalidTransition) {
        WorkflowError::InvalidTransition { from: f, to: t, .. } => {
            assert_eq!((f.as_str(), t.as_str()), (from, to));
        }
        other => panic!("expected invalid transition, got {:?}", other),
    }
}

/// Asserts that two Money values are equal within a tolerance
///
/// # Arguments
///
/// * `actual` - The actual Money value
/// * `expected` - The expected Money value
/// * `tolerance` - The allowed difference in the amount
pub fn assert_money_approx_eq(actual: Money, expected: Money, tolerance: Decimal) {
    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual,
        expected,
        diff,
        tolerance
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_kind_returns_error() {
        let result: Result<(), WorkflowError> = Err(WorkflowError::validation("nope"));
        let err = assert_kind(result, ErrorKind::Validation);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    #[should_panic]
    fn test_assert_kind_panics_on_ok() {
        assert_kind(Ok::<_, WorkflowError>(1), ErrorKind::Conflict);
    }

    #[test]
    fn test_money_approx_eq() {
        assert_money_approx_eq(Money::new(dec!(10.001)), Money::new(dec!(10.00)), dec!(0.01));
    }
}
