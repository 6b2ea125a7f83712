//! Core types and data structures for the token ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token quantity in the smallest denomination
pub type Balance = u64;

/// Opaque identity of an owner, spender, or caller
///
/// The ledger trusts whatever identity the caller layer hands it; no
/// authentication happens here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Textual form of the principal
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One owner's holdings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identity holding the balance
    pub owner: Principal,
    /// Current balance
    pub balance: Balance,
    /// When the account was first credited
    pub created_at: NaiveDateTime,
    /// When the balance last changed
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create an empty account
    pub fn new(owner: Principal) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            owner,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the balance and bump the update timestamp
    pub(crate) fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// Key of an allowance record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowanceKey {
    pub owner: Principal,
    pub spender: Principal,
}

impl AllowanceKey {
    pub fn new(owner: Principal, spender: Principal) -> Self {
        Self { owner, spender }
    }
}

/// Standing permission for `spender` to move up to `amount` of `owner`'s tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub owner: Principal,
    pub spender: Principal,
    /// Remaining amount the spender may debit
    pub amount: Balance,
    /// When the allowance was last approved or consumed
    pub updated_at: NaiveDateTime,
}

/// A mutating ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Create new supply credited to `owner`
    Mint { owner: Principal, amount: Balance },
    /// Move `amount` from `from` to `to`
    Transfer {
        from: Principal,
        to: Principal,
        amount: Balance,
    },
    /// Overwrite the allowance `owner` grants `spender`
    Approve {
        owner: Principal,
        spender: Principal,
        amount: Balance,
    },
    /// Spend from `owner` against the allowance held by `spender`, crediting `recipient`
    TransferFrom {
        owner: Principal,
        spender: Principal,
        recipient: Principal,
        amount: Balance,
    },
}

impl Operation {
    /// Short operation name used in logs and reason messages
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Mint { .. } => "mint",
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transferFrom",
        }
    }

    /// Amount carried by the operation
    pub fn amount(&self) -> Balance {
        match self {
            Operation::Mint { amount, .. }
            | Operation::Transfer { amount, .. }
            | Operation::Approve { amount, .. }
            | Operation::TransferFrom { amount, .. } => *amount,
        }
    }

    /// Whether the operation touches the given principal's balance or allowances
    pub fn involves(&self, principal: &Principal) -> bool {
        match self {
            Operation::Mint { owner, .. } => owner == principal,
            Operation::Transfer { from, to, .. } => from == principal || to == principal,
            Operation::Approve { owner, spender, .. } => {
                owner == principal || spender == principal
            }
            Operation::TransferFrom {
                owner,
                spender,
                recipient,
                ..
            } => owner == principal || spender == principal || recipient == principal,
        }
    }
}

/// Record of one committed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique identifier for the receipt
    pub id: Uuid,
    /// Position in the commit order, starting at 1
    pub sequence: u64,
    /// The operation that was applied
    pub operation: Operation,
    /// Caller identity, when one was supplied
    pub caller: Option<Principal>,
    /// When the operation was committed
    pub recorded_at: NaiveDateTime,
}

impl Receipt {
    pub fn new(sequence: u64, operation: Operation, caller: Option<Principal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            operation,
            caller,
            recorded_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Comparison of total supply against the sum of all balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyAudit {
    /// Recorded total supply
    pub total_supply: Balance,
    /// Sum of every account balance
    pub sum_of_balances: u128,
    /// Number of account records
    pub account_count: usize,
}

impl SupplyAudit {
    /// Whether supply and balances agree
    pub fn is_conserved(&self) -> bool {
        self.sum_of_balances == u128::from(self.total_supply)
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient balance for {owner}: available {available}, requested {requested}")]
    InsufficientBalance {
        owner: Principal,
        available: Balance,
        requested: Balance,
    },
    #[error(
        "Insufficient allowance from {owner} to {spender}: allowed {allowed}, requested {requested}"
    )]
    InsufficientAllowance {
        owner: Principal,
        spender: Principal,
        allowed: Balance,
        requested: Balance,
    },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Stable reason code for callers that need more than a boolean
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::Overflow(_) => "OVERFLOW",
            LedgerError::Validation(_) => "VALIDATION",
            LedgerError::Storage(_) => "STORAGE",
            LedgerError::Config(_) => "CONFIG",
        }
    }

    /// Expected business outcome, as opposed to a storage or configuration fault
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Storage(_) | LedgerError::Config(_))
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
