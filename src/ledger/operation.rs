//! Operation authorization, commit, and history

use crate::ledger::{LedgerSnapshot, LedgerState};
use crate::traits::*;
use crate::types::*;

/// Write side of the ledger
pub struct OperationManager<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn OperationValidator>,
}

impl<S: LedgerStorage> OperationManager<S> {
    /// Create a new operation manager with the permissive validator
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultOperationValidator),
        }
    }

    /// Create a new operation manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn OperationValidator>) -> Self {
        Self { storage, validator }
    }

    /// Authorize and atomically apply an operation
    pub async fn submit(
        &self,
        operation: Operation,
        caller: Option<&Principal>,
    ) -> LedgerResult<Receipt> {
        self.validator.authorize(&operation, caller)?;

        match self.storage.commit(&operation, caller).await {
            Ok(receipt) => {
                if let Operation::Mint { owner, amount } = &operation {
                    tracing::info!(%owner, amount, sequence = receipt.sequence, "minted");
                } else {
                    tracing::debug!(
                        op = operation.name(),
                        amount = operation.amount(),
                        sequence = receipt.sequence,
                        "committed"
                    );
                }
                Ok(receipt)
            }
            Err(e) if e.is_rejection() => {
                tracing::debug!(op = operation.name(), code = e.code(), "rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(op = operation.name(), "storage failure: {}", e);
                Err(e)
            }
        }
    }

    /// Receipts committed after `since`
    pub async fn history(&self, since: u64) -> LedgerResult<Vec<Receipt>> {
        self.storage.receipts(since).await
    }

    /// Receipts of operations touching `principal`
    pub async fn history_for(&self, principal: &Principal) -> LedgerResult<Vec<Receipt>> {
        Ok(self
            .storage
            .receipts(0)
            .await?
            .into_iter()
            .filter(|receipt| receipt.operation.involves(principal))
            .collect())
    }

    /// Store and receipt log read under one storage guard
    pub async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        self.storage.snapshot().await
    }

    /// Rebuild a store from the full receipt log
    pub async fn replay(&self) -> LedgerResult<LedgerState> {
        replay_receipts(&self.storage.receipts(0).await?)
    }
}

/// Apply receipts in order to an empty store
///
/// Cost grows with the whole log; there is no checkpointing.
pub fn replay_receipts(receipts: &[Receipt]) -> LedgerResult<LedgerState> {
    let mut state = LedgerState::new();
    for receipt in receipts {
        state.apply(&receipt.operation).map_err(|e| {
            LedgerError::Validation(format!(
                "receipt {} does not replay: {}",
                receipt.sequence, e
            ))
        })?;
    }
    Ok(state)
}
