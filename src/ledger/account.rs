//! Account and allowance queries

use crate::traits::*;
use crate::types::*;

/// Read side of the ledger: balances, allowances, and supply
pub struct AccountManager<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Balance of an owner; unknown owners hold zero
    pub async fn balance_of(&self, owner: &Principal) -> LedgerResult<Balance> {
        self.storage.balance_of(owner).await
    }

    /// Allowance from owner to spender; missing records are zero
    pub async fn allowance_of(
        &self,
        owner: &Principal,
        spender: &Principal,
    ) -> LedgerResult<Balance> {
        self.storage.allowance_of(owner, spender).await
    }

    pub async fn total_supply(&self) -> LedgerResult<Balance> {
        self.storage.total_supply().await
    }

    /// Get an account record by owner
    pub async fn get_account(&self, owner: &Principal) -> LedgerResult<Option<Account>> {
        self.storage.get_account(owner).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts().await
    }

    /// Allowances an owner has granted
    pub async fn allowances_of_owner(&self, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
        self.storage.list_allowances(owner).await
    }

    /// How much `spender` can actually move out of `owner` right now
    ///
    /// A transfer from an allowance is bounded by both the allowance and the
    /// owner's balance.
    pub async fn spendable(&self, owner: &Principal, spender: &Principal) -> LedgerResult<Balance> {
        self.storage.spendable(owner, spender).await
    }

    pub async fn audit(&self) -> LedgerResult<SupplyAudit> {
        self.storage.audit().await
    }
}
