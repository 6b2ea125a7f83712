//! Wire-form ledger requests

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::validate_amount;

/// A ledger request as it arrives from outside the process
///
/// Amounts are arbitrary decimals here so that negative, fractional, and
/// oversized inputs survive parsing and are rejected with
/// [`LedgerError::InvalidAmount`] rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Instruction {
    Mint {
        owner: Principal,
        amount: BigDecimal,
        #[serde(default)]
        caller: Option<Principal>,
    },
    Transfer {
        from: Principal,
        to: Principal,
        amount: BigDecimal,
        #[serde(default)]
        caller: Option<Principal>,
    },
    Approve {
        spender: Principal,
        amount: BigDecimal,
        caller: Principal,
    },
    TransferFrom {
        owner: Principal,
        spender: Principal,
        /// Defaults to the spender
        #[serde(default)]
        recipient: Option<Principal>,
        amount: BigDecimal,
        #[serde(default)]
        caller: Option<Principal>,
    },
}

impl Instruction {
    /// Parse an instruction from JSON
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Validation(e.to_string()))
    }

    /// Caller identity attached to the instruction
    pub fn caller(&self) -> Option<&Principal> {
        match self {
            Instruction::Mint { caller, .. }
            | Instruction::Transfer { caller, .. }
            | Instruction::TransferFrom { caller, .. } => caller.as_ref(),
            Instruction::Approve { caller, .. } => Some(caller),
        }
    }

    /// Validate amounts and convert into a ledger operation plus caller
    pub fn into_operation(self) -> LedgerResult<(Operation, Option<Principal>)> {
        match self {
            Instruction::Mint {
                owner,
                amount,
                caller,
            } => Ok((
                Operation::Mint {
                    owner,
                    amount: validate_amount(&amount)?,
                },
                caller,
            )),
            Instruction::Transfer {
                from,
                to,
                amount,
                caller,
            } => Ok((
                Operation::Transfer {
                    from,
                    to,
                    amount: validate_amount(&amount)?,
                },
                caller,
            )),
            Instruction::Approve {
                spender,
                amount,
                caller,
            } => Ok((
                Operation::Approve {
                    owner: caller.clone(),
                    spender,
                    amount: validate_amount(&amount)?,
                },
                Some(caller),
            )),
            Instruction::TransferFrom {
                owner,
                spender,
                recipient,
                amount,
                caller,
            } => {
                let recipient = recipient.unwrap_or_else(|| spender.clone());
                Ok((
                    Operation::TransferFrom {
                        owner,
                        spender,
                        recipient,
                        amount: validate_amount(&amount)?,
                    },
                    caller,
                ))
            }
        }
    }
}
