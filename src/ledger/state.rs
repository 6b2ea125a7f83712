//! Ledger store: balances, allowances, and total supply

use std::collections::HashMap;

use crate::types::*;

/// Authoritative mapping of owner to account and (owner, spender) to allowance
///
/// Every mutation goes through [`LedgerState::apply`], which checks all
/// preconditions before touching either map. A failed `apply` leaves the
/// state exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    accounts: HashMap<Principal, Account>,
    allowances: HashMap<AllowanceKey, Allowance>,
    total_supply: Balance,
}

impl LedgerState {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `owner`, zero when no account exists
    pub fn balance_of(&self, owner: &Principal) -> Balance {
        self.accounts.get(owner).map_or(0, |account| account.balance)
    }

    /// Allowance `owner` grants `spender`, zero when no record exists
    pub fn allowance_of(&self, owner: &Principal, spender: &Principal) -> Balance {
        self.allowances
            .get(&AllowanceKey::new(owner.clone(), spender.clone()))
            .map_or(0, |allowance| allowance.amount)
    }

    pub fn total_supply(&self) -> Balance {
        self.total_supply
    }

    /// How much `spender` can move out of `owner`: the allowance, capped by the balance
    pub fn spendable(&self, owner: &Principal, spender: &Principal) -> Balance {
        self.allowance_of(owner, spender).min(self.balance_of(owner))
    }

    pub fn account(&self, owner: &Principal) -> Option<&Account> {
        self.accounts.get(owner)
    }

    /// All account records, ordered by owner
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.owner.cmp(&b.owner));
        accounts
    }

    /// Allowances granted by `owner`, ordered by spender
    pub fn allowances_granted_by(&self, owner: &Principal) -> Vec<Allowance> {
        let mut allowances: Vec<Allowance> = self
            .allowances
            .values()
            .filter(|allowance| &allowance.owner == owner)
            .cloned()
            .collect();
        allowances.sort_by(|a, b| a.spender.cmp(&b.spender));
        allowances
    }

    /// Recompute the sum of balances and compare it with the recorded supply
    pub fn audit(&self) -> SupplyAudit {
        SupplyAudit {
            total_supply: self.total_supply,
            sum_of_balances: self
                .accounts
                .values()
                .map(|account| u128::from(account.balance))
                .sum(),
            account_count: self.accounts.len(),
        }
    }

    /// Validate and apply one operation
    pub fn apply(&mut self, operation: &Operation) -> LedgerResult<()> {
        match operation {
            Operation::Mint { owner, amount } => self.mint(owner, *amount),
            Operation::Transfer { from, to, amount } => self.transfer(from, to, *amount),
            Operation::Approve {
                owner,
                spender,
                amount,
            } => {
                self.approve(owner, spender, *amount);
                Ok(())
            }
            Operation::TransferFrom {
                owner,
                spender,
                recipient,
                amount,
            } => self.transfer_from(owner, spender, recipient, *amount),
        }
    }

    fn mint(&mut self, owner: &Principal, amount: Balance) -> LedgerResult<()> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow("total supply".to_string()))?;
        let new_balance = self
            .balance_of(owner)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("balance of {}", owner)))?;

        self.total_supply = new_supply;
        self.account_mut(owner).set_balance(new_balance);
        Ok(())
    }

    fn transfer(&mut self, from: &Principal, to: &Principal, amount: Balance) -> LedgerResult<()> {
        self.check_debit(from, amount)?;
        self.move_balance(from, to, amount)
    }

    fn approve(&mut self, owner: &Principal, spender: &Principal, amount: Balance) {
        let key = AllowanceKey::new(owner.clone(), spender.clone());
        self.allowances.insert(
            key,
            Allowance {
                owner: owner.clone(),
                spender: spender.clone(),
                amount,
                updated_at: chrono::Utc::now().naive_utc(),
            },
        );
    }

    fn transfer_from(
        &mut self,
        owner: &Principal,
        spender: &Principal,
        recipient: &Principal,
        amount: Balance,
    ) -> LedgerResult<()> {
        let key = AllowanceKey::new(owner.clone(), spender.clone());
        let allowed = match self.allowances.get(&key) {
            Some(allowance) if allowance.amount >= amount => allowance.amount,
            other => {
                return Err(LedgerError::InsufficientAllowance {
                    owner: owner.clone(),
                    spender: spender.clone(),
                    allowed: other.map_or(0, |allowance| allowance.amount),
                    requested: amount,
                })
            }
        };
        self.check_debit(owner, amount)?;

        // Both checks passed; the recipient credit is the only step left that can fail.
        self.move_balance(owner, recipient, amount)?;
        if let Some(allowance) = self.allowances.get_mut(&key) {
            allowance.amount = allowed - amount;
            allowance.updated_at = chrono::Utc::now().naive_utc();
        }
        Ok(())
    }

    /// A debit requires an existing account holding at least `amount`
    fn check_debit(&self, owner: &Principal, amount: Balance) -> LedgerResult<()> {
        match self.accounts.get(owner) {
            Some(account) if account.balance >= amount => Ok(()),
            other => Err(LedgerError::InsufficientBalance {
                owner: owner.clone(),
                available: other.map_or(0, |account| account.balance),
                requested: amount,
            }),
        }
    }

    /// Move funds whose debit has already been checked
    fn move_balance(&mut self, from: &Principal, to: &Principal, amount: Balance) -> LedgerResult<()> {
        if from == to {
            return Ok(());
        }
        let new_from = self.balance_of(from) - amount;
        let new_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("balance of {}", to)))?;

        self.account_mut(from).set_balance(new_from);
        self.account_mut(to).set_balance(new_to);
        Ok(())
    }

    fn account_mut(&mut self, owner: &Principal) -> &mut Account {
        self.accounts
            .entry(owner.clone())
            .or_insert_with(|| Account::new(owner.clone()))
    }
}

/// Store and receipt log captured together
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub state: LedgerState,
    /// Every receipt up to the captured state, in commit order
    pub receipts: Vec<Receipt>,
}
