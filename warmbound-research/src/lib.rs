//! Research plumbing around the Warmbound funnel engine.
//!
//! A lookup turns a company identifier into a `ResearchRecord`:
//! 1. The identifier is normalized (trimmed, lowercased) and validated
//! 2. The local cache is checked for a previous record
//! 3. On a miss the research provider is called
//! 4. A fresh record is written back to the cache
//!
//! The record then seeds a `ParameterStore`, which owns the editable
//! parameter snapshot and projects it through the engine on demand.

pub mod cache;
pub mod error;
pub mod lookup;
pub mod payload;
pub mod provider;
pub mod providers;
pub mod record;
pub mod store;

pub use cache::{CacheEntry, JsonFileCache, MemoryCache, ResearchCache};
pub use error::{ResearchError, ResearchResult};
pub use lookup::{Lookup, LookupOutcome, LookupSource};
pub use payload::{parse_research_payload, strip_code_fences, validate_record};
pub use provider::ResearchProvider;
pub use providers::chat::{ChatProviderConfig, ChatResearchProvider};
pub use providers::endpoint::ResearchEndpointClient;
pub use record::{normalize_identifier, MetricNotes, ResearchRecord, ResearchRequest};
pub use store::{
    LookupTicket, ParameterStore, RangeWarning, SeedOutcome, Snapshot, StoreError, StoreState,
};
