use async_trait::async_trait;

use crate::error::ResearchResult;
use crate::record::ResearchRecord;

/// Anything that can research a company by its normalized domain.
///
/// Implementations make at most one outbound request per call and never
/// retry; the user re-invokes the lookup instead.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Research a company. `domain` is already normalized.
    async fn research(&self, domain: &str) -> ResearchResult<ResearchRecord>;

    /// Name used in logs: the implementing type without its module path.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}
