//! Traits for storage abstraction and authorization policy

use async_trait::async_trait;

use crate::ledger::LedgerSnapshot;
use crate::types::*;

/// Storage abstraction for the token ledger
///
/// Implementations own their synchronization. `commit` must run the whole
/// read-validate-write sequence for one operation as a single atomic unit:
/// no other commit may interleave with it and no reader may observe a
/// partially applied operation.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Balance of an owner, zero when the account does not exist
    async fn balance_of(&self, owner: &Principal) -> LedgerResult<Balance>;

    /// Allowance from owner to spender, zero when no record exists
    async fn allowance_of(&self, owner: &Principal, spender: &Principal)
        -> LedgerResult<Balance>;

    /// Allowance from owner to spender capped by the owner's balance,
    /// both read at the same instant
    async fn spendable(&self, owner: &Principal, spender: &Principal) -> LedgerResult<Balance>;

    /// Total minted supply
    async fn total_supply(&self) -> LedgerResult<Balance>;

    /// Get an account record by owner
    async fn get_account(&self, owner: &Principal) -> LedgerResult<Option<Account>>;

    /// List all account records
    async fn list_accounts(&self) -> LedgerResult<Vec<Account>>;

    /// List the allowances an owner has granted
    async fn list_allowances(&self, owner: &Principal) -> LedgerResult<Vec<Allowance>>;

    /// Compare total supply with the sum of balances
    async fn audit(&self) -> LedgerResult<SupplyAudit>;

    /// Validate and apply an operation, returning its receipt
    async fn commit(
        &self,
        operation: &Operation,
        caller: Option<&Principal>,
    ) -> LedgerResult<Receipt>;

    /// Receipts with a sequence number greater than `since`, in commit order
    async fn receipts(&self, since: u64) -> LedgerResult<Vec<Receipt>>;

    /// Store and full receipt log as of one instant, with no commit in between
    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot>;
}

/// Trait for implementing authorization rules over ledger operations
pub trait OperationValidator: Send + Sync {
    /// Decide whether `caller` may perform `operation`
    fn authorize(&self, operation: &Operation, caller: Option<&Principal>) -> LedgerResult<()>;
}

/// Permissive validator
///
/// Any caller, or no caller at all, may mint to any account and move funds
/// out of any account. This matches the behavior the ledger was specified
/// with; use [`crate::utils::StrictOperationValidator`] to close it.
pub struct DefaultOperationValidator;

impl OperationValidator for DefaultOperationValidator {
    fn authorize(&self, _operation: &Operation, _caller: Option<&Principal>) -> LedgerResult<()> {
        Ok(())
    }
}
