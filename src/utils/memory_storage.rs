//! In-memory storage implementation

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ledger::{LedgerSnapshot, LedgerState};
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    state: LedgerState,
    receipts: Vec<Receipt>,
}

/// In-memory storage for tests, demos, and embedding
///
/// Balances, allowances, and the receipt log sit behind one lock, so a commit
/// holds exclusive access to everything it reads and writes, and readers see
/// either all or none of it. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data
    pub fn clear(&self) -> LedgerResult<()> {
        let mut inner = self.write()?;
        inner.state = LedgerState::new();
        inner.receipts.clear();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn balance_of(&self, owner: &Principal) -> LedgerResult<Balance> {
        Ok(self.read()?.state.balance_of(owner))
    }

    async fn allowance_of(
        &self,
        owner: &Principal,
        spender: &Principal,
    ) -> LedgerResult<Balance> {
        Ok(self.read()?.state.allowance_of(owner, spender))
    }

    async fn spendable(&self, owner: &Principal, spender: &Principal) -> LedgerResult<Balance> {
        Ok(self.read()?.state.spendable(owner, spender))
    }

    async fn total_supply(&self) -> LedgerResult<Balance> {
        Ok(self.read()?.state.total_supply())
    }

    async fn get_account(&self, owner: &Principal) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.state.account(owner).cloned())
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        Ok(self.read()?.state.accounts())
    }

    async fn list_allowances(&self, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
        Ok(self.read()?.state.allowances_granted_by(owner))
    }

    async fn audit(&self) -> LedgerResult<SupplyAudit> {
        Ok(self.read()?.state.audit())
    }

    async fn commit(
        &self,
        operation: &Operation,
        caller: Option<&Principal>,
    ) -> LedgerResult<Receipt> {
        let mut inner = self.write()?;
        inner.state.apply(operation)?;

        let sequence = inner.receipts.len() as u64 + 1;
        let receipt = Receipt::new(sequence, operation.clone(), caller.cloned());
        inner.receipts.push(receipt.clone());
        Ok(receipt)
    }

    async fn receipts(&self, since: u64) -> LedgerResult<Vec<Receipt>> {
        let inner = self.read()?;
        // Sequences are dense and start at 1, so `since` is also the slice offset.
        let start = usize::try_from(since)
            .unwrap_or(usize::MAX)
            .min(inner.receipts.len());
        Ok(inner.receipts[start..].to_vec())
    }

    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let inner = self.read()?;
        Ok(LedgerSnapshot {
            state: inner.state.clone(),
            receipts: inner.receipts.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_appends_receipts_in_order() {
        let storage = MemoryStorage::new();
        let alice = Principal::from("alice");

        let first = storage
            .commit(
                &Operation::Mint {
                    owner: alice.clone(),
                    amount: 5,
                },
                None,
            )
            .await
            .unwrap();
        let second = storage
            .commit(
                &Operation::Approve {
                    owner: alice.clone(),
                    spender: "bob".into(),
                    amount: 2,
                },
                Some(&alice),
            )
            .await
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.caller, Some(alice));
        assert_eq!(storage.receipts(0).await.unwrap().len(), 2);
        assert_eq!(storage.receipts(1).await.unwrap(), vec![second]);
        assert!(storage.receipts(9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_commit_writes_no_receipt() {
        let storage = MemoryStorage::new();
        let result = storage
            .commit(
                &Operation::Transfer {
                    from: "alice".into(),
                    to: "bob".into(),
                    amount: 1,
                },
                None,
            )
            .await;
        assert!(result.is_err());
        assert!(storage.receipts(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state_and_clear_resets() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        clone
            .commit(
                &Operation::Mint {
                    owner: "alice".into(),
                    amount: 3,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(storage.balance_of(&"alice".into()).await.unwrap(), 3);
        assert_eq!(storage.snapshot().await.unwrap().state.total_supply(), 3);

        storage.clear().unwrap();
        assert_eq!(clone.total_supply().await.unwrap(), 0);
        assert!(clone.receipts(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_a_storage_fault() {
        let storage = MemoryStorage::new();
        let alice = Principal::from("alice");
        storage
            .commit(
                &Operation::Mint {
                    owner: alice.clone(),
                    amount: 5,
                },
                None,
            )
            .await
            .unwrap();

        let inner = Arc::clone(&storage.inner);
        let _ = std::thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("writer died holding the ledger lock");
        })
        .join();
        assert!(storage.inner.is_poisoned());

        let err = storage
            .commit(
                &Operation::Mint {
                    owner: alice.clone(),
                    amount: 1,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(!err.is_rejection());
        assert_eq!(err.code(), "STORAGE");
        assert!(matches!(
            storage.balance_of(&alice).await,
            Err(LedgerError::Storage(_))
        ));
        assert!(storage.snapshot().await.is_err());

        let ledger = crate::ledger::TokenLedger::new(storage.clone());
        assert_eq!(ledger.balance_of(&alice).await, 0);
        assert_eq!(ledger.allowance_of(&alice, &"bob".into()).await, 0);
        assert!(!ledger.mint(&alice, 1).await);
        assert!(ledger.try_transfer(&alice, &"bob".into(), 1).await.is_err());
        assert!(ledger.validate_integrity().await.is_err());
    }
}
