//! Validation utilities

use bigdecimal::{BigDecimal, ToPrimitive};
use std::collections::HashSet;

use crate::traits::*;
use crate::types::*;

/// Convert an externally supplied amount into a ledger balance
///
/// Rejects negative, fractional, and out-of-range values with
/// [`LedgerError::InvalidAmount`]. Zero is a valid amount.
pub fn validate_amount(amount: &BigDecimal) -> LedgerResult<Balance> {
    if *amount < BigDecimal::from(0) {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must not be negative, got {}",
            amount
        )));
    }

    if !amount.is_integer() {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be a whole number of base units, got {}",
            amount
        )));
    }

    amount.to_u64().ok_or_else(|| {
        LedgerError::InvalidAmount(format!("amount {} exceeds {}", amount, Balance::MAX))
    })
}

/// Validate that a principal is usable as an identity
pub fn validate_principal(principal: &str) -> LedgerResult<()> {
    if principal.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Principal cannot be empty".to_string(),
        ));
    }

    if principal.len() > 128 {
        return Err(LedgerError::Validation(
            "Principal cannot exceed 128 characters".to_string(),
        ));
    }

    if principal.chars().any(char::is_whitespace) {
        return Err(LedgerError::Validation(
            "Principal cannot contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Validator that ties every operation to its caller
///
/// - `mint` requires a caller in the configured minter set
/// - `transfer` requires `caller == from`
/// - `approve` requires `caller == owner`
/// - `transferFrom` requires `caller == spender`
pub struct StrictOperationValidator {
    minters: HashSet<Principal>,
}

impl StrictOperationValidator {
    pub fn new(minters: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            minters: minters.into_iter().collect(),
        }
    }

    pub fn is_minter(&self, principal: &Principal) -> bool {
        self.minters.contains(principal)
    }
}

impl OperationValidator for StrictOperationValidator {
    fn authorize(&self, operation: &Operation, caller: Option<&Principal>) -> LedgerResult<()> {
        let caller = caller.ok_or_else(|| {
            LedgerError::Unauthorized(format!("{} requires a caller identity", operation.name()))
        })?;
        validate_principal(caller.as_str())?;

        let allowed = match operation {
            Operation::Mint { .. } => self.is_minter(caller),
            Operation::Transfer { from, .. } => from == caller,
            Operation::Approve { owner, .. } => owner == caller,
            Operation::TransferFrom { spender, .. } => spender == caller,
        };

        if allowed {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(format!(
                "{} may not perform {}",
                caller,
                operation.name()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(&BigDecimal::from(0)).unwrap(), 0);
        assert_eq!(validate_amount(&BigDecimal::from(42)).unwrap(), 42);
        assert_eq!(
            validate_amount(&BigDecimal::from(u64::MAX)).unwrap(),
            u64::MAX
        );

        let negative = validate_amount(&BigDecimal::from(-1)).unwrap_err();
        assert_eq!(negative.code(), "INVALID_AMOUNT");

        let fractional = BigDecimal::from_str("1.5").unwrap();
        assert!(validate_amount(&fractional).is_err());

        let too_large = BigDecimal::from_str("18446744073709551616").unwrap();
        assert!(validate_amount(&too_large).is_err());
    }

    #[test]
    fn test_validate_principal() {
        assert!(validate_principal("rrkah-fqaaa-aaaaa-aaaaq-cai").is_ok());
        assert!(validate_principal("").is_err());
        assert!(validate_principal("two words").is_err());
        assert!(validate_principal(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_strict_validator() {
        let validator = StrictOperationValidator::new(vec![Principal::from("treasury")]);
        let alice = Principal::from("alice");
        let treasury = Principal::from("treasury");

        let mint = Operation::Mint {
            owner: alice.clone(),
            amount: 1,
        };
        assert!(validator.authorize(&mint, Some(&treasury)).is_ok());
        assert!(validator.authorize(&mint, Some(&alice)).is_err());
        assert!(validator.authorize(&mint, None).is_err());

        let transfer = Operation::Transfer {
            from: alice.clone(),
            to: treasury.clone(),
            amount: 1,
        };
        assert!(validator.authorize(&transfer, Some(&alice)).is_ok());
        assert!(validator.authorize(&transfer, Some(&treasury)).is_err());

        let spend = Operation::TransferFrom {
            owner: alice.clone(),
            spender: treasury.clone(),
            recipient: treasury.clone(),
            amount: 1,
        };
        assert!(validator.authorize(&spend, Some(&treasury)).is_ok());
        assert!(validator.authorize(&spend, Some(&alice)).is_err());
    }
}
