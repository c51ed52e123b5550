//! NFA-1 Store - Reference Agent Token Store
//!
//! An in-memory agent token store (`AgentStore`) and the ABI dispatcher that
//! exposes it as a callable contract (`StoreContract`). The store is the
//! conformance baseline the verifier is tested against; it is not a
//! production ledger.

pub mod contract;
pub mod error;
pub mod store;

pub use contract::{CallContext, Contract, StoreContract};
pub use error::{StoreError, StoreResult};
pub use store::{AgentRecord, AgentStore, StoreEvent};

// Commitment helpers for learning and vault data live with the data model.
pub use nfa1_core::{compute_vault_digest, learning_merkle_root};
