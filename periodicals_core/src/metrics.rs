use std::fmt;

/// Catalog collection touched by a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Events,
    Contracts,
    ContractSeasons,
    CustomEggs,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Events => "events",
            Collection::Contracts => "contracts",
            Collection::ContractSeasons => "contract_seasons",
            Collection::CustomEggs => "custom_eggs",
        };
        f.write_str(name)
    }
}

/// Record counts for one merge workflow.
///
/// `dropped` counts inputs absent from the written collection: duplicates,
/// filtered fresh entries and, for seasons, undecodable records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub collection: Collection,
    pub fresh: usize,
    pub persisted: usize,
    pub dropped: usize,
    pub written: usize,
}

impl MergeSummary {
    pub fn new(collection: Collection, fresh: usize, persisted: usize, written: usize) -> Self {
        Self {
            collection,
            fresh,
            persisted,
            dropped: (fresh + persisted).saturating_sub(written),
            written,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            target: "periodicals::merge",
            collection = %self.collection,
            fresh = self.fresh,
            persisted = self.persisted,
            dropped = self.dropped,
            written = self.written,
            "merge.completed"
        );
    }
}
