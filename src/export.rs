//! JSON snapshot export of a whole brain as thoughts + connections.
//!
//! ```text
//! Store → export_snapshot() → BrainSnapshot → serde_json
//!   → backup file, or import_snapshot() into a fresh store
//! ```
//!
//! Documents are not part of the snapshot; they live in the text store.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::*;
use crate::storage::Store;
use crate::{Error, Result};

/// Format marker written into every snapshot.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Every thought and connection of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainSnapshot {
    pub format: u32,
    pub exported_at: chrono::DateTime<chrono::Utc>,
    pub thoughts: Vec<ThoughtRecord>,
    pub connections: Vec<ConnectionRecord>,
}

/// Read the whole store.
///
/// Each connection appears once, listed under its `from` thought.
pub fn export_snapshot<S: Store + ?Sized>(store: &S) -> Result<BrainSnapshot> {
    let thoughts = store.list_thoughts()?;
    let mut connections = Vec::new();
    for thought in &thoughts {
        for kind in [ConnectionType::Child, ConnectionType::Link] {
            connections.extend(store.get_connections(ConnectionFilter::From(thought.id, kind))?);
        }
    }
    Ok(BrainSnapshot {
        format: SNAPSHOT_FORMAT,
        exported_at: chrono::Utc::now(),
        thoughts,
        connections,
    })
}

/// Export the store as pretty-printed JSON.
pub fn write_snapshot<S: Store + ?Sized>(store: &S, writer: &mut dyn Write) -> Result<()> {
    let snapshot = export_snapshot(store)?;
    serde_json::to_writer_pretty(&mut *writer, &snapshot)?;
    writeln!(writer)?;
    Ok(())
}

/// Parse a snapshot written by `write_snapshot`.
pub fn read_snapshot(reader: &mut dyn Read) -> Result<BrainSnapshot> {
    let snapshot: BrainSnapshot = serde_json::from_reader(reader)?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(Error::InvalidArgument(format!(
            "unsupported snapshot format {} (expected {SNAPSHOT_FORMAT})",
            snapshot.format
        )));
    }
    Ok(snapshot)
}

/// Load a snapshot into an empty store, all or nothing.
///
/// Pairs that appear twice in the snapshot keep only the last connection,
/// so the one-connection-per-pair rule holds afterwards.
pub fn import_snapshot<S: Store + ?Sized>(store: &S, snapshot: &BrainSnapshot) -> Result<()> {
    if store.thought_count()? != 0 {
        return Err(Error::InvalidArgument("import target store is not empty".into()));
    }

    let tx = store.begin_tx()?;
    let loaded: Result<()> = (|| {
        for t in &snapshot.thoughts {
            store.insert_thought(t.id, &t.name)?;
        }
        for c in &snapshot.connections {
            store.delete_connection(c.from, c.to)?;
            store.insert_connection(c.from, c.to, c.kind)?;
        }
        Ok(())
    })();

    match loaded {
        Ok(()) => {
            store.commit_tx(tx)?;
            info!(
                thoughts = snapshot.thoughts.len(),
                connections = snapshot.connections.len(),
                "imported snapshot"
            );
            Ok(())
        }
        Err(e) => {
            store.rollback_tx(tx)?;
            Err(e)
        }
    }
}
