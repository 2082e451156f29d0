//! Database handle interface.
//!
//! The pipeline only needs to know whether the store is reachable; query
//! patterns belong to the domain cores.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DbError {
    #[error("database {name} unavailable")]
    Unavailable { name: String },
}

#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;
    async fn ping(&self) -> Result<(), DbError>;
}

/// Process-local store used when no external database is configured.
#[derive(Debug)]
pub struct MemoryDb {
    available: AtomicBool,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}

#[async_trait]
impl Database for MemoryDb {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DbError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(DbError::Unavailable {
                name: self.name().to_string(),
            })
        }
    }
}
