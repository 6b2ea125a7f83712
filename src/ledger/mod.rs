//! Ledger module containing the store, queries, and operation processing

pub mod account;
pub mod core;
pub mod instruction;
pub mod operation;
pub mod state;

pub use account::*;
pub use self::core::*;
pub use instruction::*;
pub use operation::*;
pub use state::*;
