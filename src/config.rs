//! Engine and catalog configuration.
//!
//! Plain serde structs; hosts load them from whatever format they like.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::{ClockIds, IdGenerator, SequentialIds};

/// How new thought ids are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdStrategy {
    /// Wall-clock milliseconds (see `ids::ClockIds`).
    #[default]
    Clock,
    /// Counter starting at `start`, bumped past existing ids.
    Sequential { start: u64 },
}

impl IdStrategy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            IdStrategy::Clock => Box::new(ClockIds::new()),
            IdStrategy::Sequential { start } => Box::new(SequentialIds::starting_at(start)),
        }
    }
}

/// Settings for one `GraphEngine`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub id_strategy: IdStrategy,
}

/// Settings for a brain catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding one subdirectory per brain.
    pub root: PathBuf,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl CatalogConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), engine: EngineConfig::default() }
    }
}
