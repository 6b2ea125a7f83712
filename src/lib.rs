//! # Token Ledger
//!
//! A fungible-token ledger with delegated spending: per-owner balances,
//! capped allowances that let a spender move an owner's tokens, and atomic
//! transfers that never create or destroy value outside of minting.
//!
//! ## Features
//!
//! - **Atomic operations**: every mint, transfer, approval, and allowance spend
//!   validates fully before it mutates anything
//! - **Conservation**: total supply changes only through mint
//! - **Reason codes**: `try_*` methods report why an operation was rejected
//! - **Receipts**: every committed operation is logged and can be replayed
//! - **Authorization policy**: permissive by default, strict via configuration
//! - **Storage abstraction**: trait-based storage with an in-memory backend
//!
//! ## Quick Start
//!
//! ```rust
//! use token_ledger::{utils::MemoryStorage, Principal, TokenLedger};
//!
//! async fn demo() {
//!     let ledger = TokenLedger::new(MemoryStorage::new());
//!     let alice = Principal::from("alice");
//!     let bob = Principal::from("bob");
//!
//!     assert!(ledger.mint(&alice, 100).await);
//!     assert!(ledger.approve(&bob, 30, &alice).await);
//!     assert!(ledger.transfer_from(&alice, &bob, 30).await);
//!     assert_eq!(ledger.balance_of(&bob).await, 30);
//! }
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
