use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::summary::errors::StoreError;

/// Cache key for `content`: hex-encoded SHA-256, always 64 characters.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSummary {
    pub content_hash: String,
    /// Content sent to the backend, possibly truncated.
    pub source_content: String,
    pub summary: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedSummary {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Point operations on the summary cache. Implementations handle their own
/// concurrency.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn get(&self, content_hash: &str) -> Option<CachedSummary>;

    /// Inserts or overwrites the entry stored under `entry.content_hash`.
    async fn set(&self, entry: CachedSummary) -> Result<(), StoreError>;

    async fn delete(&self, content_hash: &str) -> Result<(), StoreError>;

    /// Removes every entry expired at `now`, returning how many went away.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySummaryStore {
    entries: Arc<DashMap<String, CachedSummary>>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn get(&self, content_hash: &str) -> Option<CachedSummary> {
        self.entries
            .get(content_hash)
            .map(|entry| entry.value().clone())
    }

    async fn set(&self, mut entry: CachedSummary) -> Result<(), StoreError> {
        match self.entries.entry(entry.content_hash.clone()) {
            Entry::Occupied(mut existing) => {
                // Overwrites keep the original creation time.
                entry.created_at = existing.get().created_at;
                existing.insert(entry);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
        Ok(())
    }

    async fn delete(&self, content_hash: &str) -> Result<(), StoreError> {
        self.entries.remove(content_hash);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if self
                .entries
                .remove_if(&key, |_, entry| entry.is_expired(now))
                .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
