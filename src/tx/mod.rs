//! Transaction handles.
//!
//! Stores hand out a `TxId` from `begin_tx` and expect the same id back in
//! `commit_tx` / `rollback_tx`. At most one transaction is open per store.

use serde::{Deserialize, Serialize};

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}
