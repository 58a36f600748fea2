//! # Notebook Graph Model
//!
//! Plain DTOs shared by the stores, the engine and callers.
//!
//! Design rule: no store handles, no SQL types here.
//! This module is pure data: no I/O and no state.

pub mod thought;
pub mod connection;
pub mod view;

pub use thought::{ThoughtId, ThoughtRecord};
pub use connection::{ConnectionType, ConnectionRecord, ConnectionFilter};
pub use view::{ViewNode, State, NeighborList};
