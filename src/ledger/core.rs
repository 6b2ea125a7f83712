//! Main ledger orchestrator that coordinates queries and operations

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::ledger::{
    replay_receipts, AccountManager, Instruction, LedgerSnapshot, OperationManager,
};
use crate::traits::*;
use crate::types::*;

/// Token ledger: mint, transfer, approve, and spend from allowances
///
/// Every mutating method runs as one atomic commit against the storage
/// backend. The `try_*` methods report the rejection reason; the plain
/// methods collapse it to `false`.
///
/// `transfer` and `mint` do not check the caller by default. Build the
/// ledger with [`TokenLedger::from_config`] and strict authorization, then
/// use the `*_as` methods, to bind operations to a caller.
pub struct TokenLedger<S: LedgerStorage> {
    account_manager: AccountManager<S>,
    operation_manager: OperationManager<S>,
}

impl<S: LedgerStorage + Clone> TokenLedger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            operation_manager: OperationManager::new(storage),
        }
    }

    /// Create a new ledger with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn OperationValidator>) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            operation_manager: OperationManager::with_validator(storage, validator),
        }
    }

    /// Create a new ledger with the policy from a configuration
    pub fn from_config(storage: S, config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self::with_validator(storage, config.validator()))
    }
}

impl<S: LedgerStorage> TokenLedger<S> {
    // Mutating operations, reason-code surface

    /// Credit `owner` with newly created supply
    pub async fn try_mint(&self, owner: &Principal, amount: Balance) -> LedgerResult<Receipt> {
        self.mint_as(None, owner, amount).await
    }

    pub async fn mint_as(
        &self,
        caller: Option<&Principal>,
        owner: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        let operation = Operation::Mint {
            owner: owner.clone(),
            amount,
        };
        self.operation_manager.submit(operation, caller).await
    }

    /// Move `amount` from `from` to `to`
    pub async fn try_transfer(
        &self,
        from: &Principal,
        to: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        self.transfer_as(None, from, to, amount).await
    }

    pub async fn transfer_as(
        &self,
        caller: Option<&Principal>,
        from: &Principal,
        to: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        let operation = Operation::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        };
        self.operation_manager.submit(operation, caller).await
    }

    /// Set the allowance `caller` grants `spender`, replacing any previous amount
    pub async fn try_approve(
        &self,
        spender: &Principal,
        amount: Balance,
        caller: &Principal,
    ) -> LedgerResult<Receipt> {
        let operation = Operation::Approve {
            owner: caller.clone(),
            spender: spender.clone(),
            amount,
        };
        self.operation_manager.submit(operation, Some(caller)).await
    }

    /// Spend `amount` of `owner`'s funds against `spender`'s allowance,
    /// crediting the spender
    pub async fn try_transfer_from(
        &self,
        owner: &Principal,
        spender: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        self.transfer_from_as(None, owner, spender, spender, amount)
            .await
    }

    /// Spend `amount` of `owner`'s funds against `spender`'s allowance,
    /// crediting `recipient`
    pub async fn transfer_from_to(
        &self,
        owner: &Principal,
        spender: &Principal,
        recipient: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        self.transfer_from_as(None, owner, spender, recipient, amount)
            .await
    }

    pub async fn transfer_from_as(
        &self,
        caller: Option<&Principal>,
        owner: &Principal,
        spender: &Principal,
        recipient: &Principal,
        amount: Balance,
    ) -> LedgerResult<Receipt> {
        let operation = Operation::TransferFrom {
            owner: owner.clone(),
            spender: spender.clone(),
            recipient: recipient.clone(),
            amount,
        };
        self.operation_manager.submit(operation, caller).await
    }

    /// Validate and apply a wire-form instruction
    pub async fn execute(&self, instruction: Instruction) -> LedgerResult<Receipt> {
        let (operation, caller) = instruction.into_operation()?;
        self.operation_manager
            .submit(operation, caller.as_ref())
            .await
    }

    // Mutating operations, boolean surface

    pub async fn mint(&self, owner: &Principal, amount: Balance) -> bool {
        self.try_mint(owner, amount).await.is_ok()
    }

    pub async fn transfer(&self, from: &Principal, to: &Principal, amount: Balance) -> bool {
        self.try_transfer(from, to, amount).await.is_ok()
    }

    pub async fn approve(&self, spender: &Principal, amount: Balance, caller: &Principal) -> bool {
        self.try_approve(spender, amount, caller).await.is_ok()
    }

    pub async fn transfer_from(
        &self,
        owner: &Principal,
        spender: &Principal,
        amount: Balance,
    ) -> bool {
        self.try_transfer_from(owner, spender, amount).await.is_ok()
    }

    // Reads

    /// Balance of `owner`, zero for unknown owners
    pub async fn balance_of(&self, owner: &Principal) -> Balance {
        self.account_manager
            .balance_of(owner)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%owner, "balance read failed: {}", e);
                0
            })
    }

    /// Allowance `owner` grants `spender`, zero when none was approved
    pub async fn allowance_of(&self, owner: &Principal, spender: &Principal) -> Balance {
        self.account_manager
            .allowance_of(owner, spender)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%owner, %spender, "allowance read failed: {}", e);
                0
            })
    }

    pub async fn total_supply(&self) -> LedgerResult<Balance> {
        self.account_manager.total_supply().await
    }

    pub async fn get_account(&self, owner: &Principal) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(owner).await
    }

    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts().await
    }

    pub async fn allowances_of_owner(&self, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
        self.account_manager.allowances_of_owner(owner).await
    }

    /// Amount `spender` could move out of `owner` right now
    pub async fn spendable(&self, owner: &Principal, spender: &Principal) -> LedgerResult<Balance> {
        self.account_manager.spendable(owner, spender).await
    }

    /// Receipts committed after sequence `since`
    pub async fn history(&self, since: u64) -> LedgerResult<Vec<Receipt>> {
        self.operation_manager.history(since).await
    }

    /// Receipts of operations touching `principal`
    pub async fn history_for(&self, principal: &Principal) -> LedgerResult<Vec<Receipt>> {
        self.operation_manager.history_for(principal).await
    }

    /// Compare total supply with the sum of balances
    pub async fn audit(&self) -> LedgerResult<SupplyAudit> {
        self.account_manager.audit().await
    }

    /// Validate the integrity of the ledger
    ///
    /// Checks that total supply equals the sum of balances and that replaying
    /// the receipt log reproduces every balance and the supply. Everything is
    /// read from one snapshot, so concurrent commits cannot produce false
    /// mismatches. The snapshot copies the store and the whole receipt log and
    /// the replay walks all of it, so the cost grows with ledger history.
    pub async fn validate_integrity(&self) -> LedgerResult<LedgerIntegrityReport> {
        let LedgerSnapshot { state, receipts } = self.operation_manager.snapshot().await?;
        let audit = state.audit();

        let mut issues = Vec::new();

        if !audit.is_conserved() {
            issues.push(format!(
                "Supply is not conserved: total supply = {}, sum of balances = {}",
                audit.total_supply, audit.sum_of_balances
            ));
        }

        match replay_receipts(&receipts) {
            Ok(replayed) => {
                if replayed.total_supply() != audit.total_supply {
                    issues.push(format!(
                        "Replayed supply {} differs from recorded supply {}",
                        replayed.total_supply(),
                        audit.total_supply
                    ));
                }
                for account in state.accounts() {
                    let expected = replayed.balance_of(&account.owner);
                    if expected != account.balance {
                        issues.push(format!(
                            "Balance of {} is {}, replay gives {}",
                            account.owner, account.balance, expected
                        ));
                    }
                }
            }
            Err(e) => issues.push(e.to_string()),
        }

        Ok(LedgerIntegrityReport {
            is_valid: issues.is_empty(),
            issues,
            total_supply: audit.total_supply,
            sum_of_balances: audit.sum_of_balances,
            account_count: audit.account_count,
            receipt_count: receipts.len(),
        })
    }
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub total_supply: Balance,
    pub sum_of_balances: u128,
    pub account_count: usize,
    pub receipt_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn test_ledger_basic_operations() {
        let ledger = TokenLedger::new(MemoryStorage::new());
        let alice = Principal::from("alice");
        let bob = Principal::from("bob");

        assert!(ledger.mint(&alice, 100).await);
        assert!(ledger.transfer(&alice, &bob, 40).await);
        assert!(!ledger.transfer(&bob, &alice, 41).await);

        assert_eq!(ledger.balance_of(&alice).await, 60);
        assert_eq!(ledger.balance_of(&bob).await, 40);
        assert_eq!(ledger.total_supply().await.unwrap(), 100);

        let report = ledger.validate_integrity().await.unwrap();
        assert!(report.is_valid, "{:?}", report.issues);
        assert_eq!(report.receipt_count, 2);
        assert_eq!(report.account_count, 2);
    }

    #[tokio::test]
    async fn test_try_methods_report_reason() {
        let ledger = TokenLedger::new(MemoryStorage::new());
        let alice = Principal::from("alice");
        let bob = Principal::from("bob");
        ledger.try_mint(&alice, 10).await.unwrap();
        ledger.try_approve(&bob, 20, &alice).await.unwrap();

        let err = ledger.try_transfer_from(&alice, &bob, 15).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                owner: alice.clone(),
                available: 10,
                requested: 15,
            }
        );

        let err = ledger.try_transfer_from(&bob, &alice, 1).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_ALLOWANCE");
    }

    /// Storage whose snapshot loses the most recent receipt
    #[derive(Clone)]
    struct TruncatedLogStorage(MemoryStorage);

    #[async_trait::async_trait]
    impl LedgerStorage for TruncatedLogStorage {
        async fn balance_of(&self, owner: &Principal) -> LedgerResult<Balance> {
            self.0.balance_of(owner).await
        }

        async fn allowance_of(
            &self,
            owner: &Principal,
            spender: &Principal,
        ) -> LedgerResult<Balance> {
            self.0.allowance_of(owner, spender).await
        }

        async fn spendable(
            &self,
            owner: &Principal,
            spender: &Principal,
        ) -> LedgerResult<Balance> {
            self.0.spendable(owner, spender).await
        }

        async fn total_supply(&self) -> LedgerResult<Balance> {
            self.0.total_supply().await
        }

        async fn get_account(&self, owner: &Principal) -> LedgerResult<Option<Account>> {
            self.0.get_account(owner).await
        }

        async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
            self.0.list_accounts().await
        }

        async fn list_allowances(&self, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
            self.0.list_allowances(owner).await
        }

        async fn audit(&self) -> LedgerResult<SupplyAudit> {
            self.0.audit().await
        }

        async fn commit(
            &self,
            operation: &Operation,
            caller: Option<&Principal>,
        ) -> LedgerResult<Receipt> {
            self.0.commit(operation, caller).await
        }

        async fn receipts(&self, since: u64) -> LedgerResult<Vec<Receipt>> {
            self.0.receipts(since).await
        }

        async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
            let mut snapshot = self.0.snapshot().await?;
            snapshot.receipts.pop();
            Ok(snapshot)
        }
    }

    #[tokio::test]
    async fn test_integrity_detects_lost_receipts() {
        let ledger = TokenLedger::new(TruncatedLogStorage(MemoryStorage::new()));
        ledger.try_mint(&"alice".into(), 5).await.unwrap();
        ledger.try_mint(&"alice".into(), 3).await.unwrap();

        let report = ledger.validate_integrity().await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.sum_of_balances, 8);
        assert_eq!(report.receipt_count, 1);
        assert_eq!(
            report.issues,
            vec![
                "Replayed supply 5 differs from recorded supply 8".to_string(),
                "Balance of alice is 8, replay gives 5".to_string(),
            ]
        );
        assert!(ledger.audit().await.unwrap().is_conserved());
    }
}
