//! Cache-first research lookup.
//!
//! Flow:
//! 1. Normalize the identifier; reject blank input before any I/O
//! 2. Cache read (skipped on refresh); a hit short-circuits
//! 3. Provider call on a miss
//! 4. Cache write-back of the fresh record
//!
//! Cache failures never fail a lookup: a broken read counts as a miss and
//! a broken write is logged after the record is already in hand.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::ResearchCache;
use crate::error::{ResearchError, ResearchResult};
use crate::provider::ResearchProvider;
use crate::record::{normalize_identifier, ResearchRecord};

/// Where a lookup's record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSource {
    Cache,
    Provider,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOutcome {
    /// Normalized identifier, also the cache key.
    pub key: String,
    pub source: LookupSource,
    pub fetched_at: DateTime<Utc>,
    pub record: ResearchRecord,
}

pub struct Lookup {
    cache: Arc<dyn ResearchCache>,
    provider: Arc<dyn ResearchProvider>,
}

impl Lookup {
    pub fn new(cache: Arc<dyn ResearchCache>, provider: Arc<dyn ResearchProvider>) -> Self {
        Self { cache, provider }
    }

    /// Look a company up, preferring the cache.
    pub async fn run(&self, identifier: &str) -> ResearchResult<LookupOutcome> {
        self.execute(identifier, false).await
    }

    /// Skip the cache read and always call the provider.
    pub async fn refresh(&self, identifier: &str) -> ResearchResult<LookupOutcome> {
        self.execute(identifier, true).await
    }

    async fn execute(&self, identifier: &str, bypass_cache: bool) -> ResearchResult<LookupOutcome> {
        let key = normalize_identifier(identifier);
        if key.is_empty() {
            return Err(ResearchError::Validation("Domain is required".into()));
        }

        if !bypass_cache {
            match self.cache.get(&key) {
                Ok(Some(entry)) => {
                    log::info!("key={} cache hit (fetched {})", key, entry.fetched_at.to_rfc3339());
                    return Ok(LookupOutcome {
                        key,
                        source: LookupSource::Cache,
                        fetched_at: entry.fetched_at,
                        record: entry.record,
                    });
                }
                Ok(None) => log::info!("key={} cache miss", key),
                Err(e) => log::warn!("key={} cache read failed, treating as miss: {}", key, e),
            }
        }

        let start = Instant::now();
        let record = match self.provider.research(&key).await {
            Ok(record) => record,
            Err(e) => {
                log::error!("key={} provider={} failed: {}", key, self.provider.name(), e);
                return Err(e);
            }
        };
        log::info!(
            "key={} provider={} fetched in {}ms",
            key,
            self.provider.name(),
            start.elapsed().as_millis()
        );

        if let Err(e) = self.cache.set(&key, &record) {
            log::warn!("key={} cache write failed: {}", key, e);
        }

        Ok(LookupOutcome {
            key,
            source: LookupSource::Provider,
            fetched_at: Utc::now(),
            record,
        })
    }
}
