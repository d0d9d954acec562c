use std::collections::HashSet;

use periodicals_runtime::proto::Contract;
use periodicals_runtime::{BlobRecord, CatalogEntry, RecordDecodeError};

use super::{decode_records, sort_by_start_time, unique_by_identity, MergeError, Retained};
use crate::config::PathsConfig;
use crate::metrics::{Collection, MergeSummary};
use crate::store::{read_collection, write_collection};

/// Tutorial contract every new player receives; not part of the catalog.
pub const ONBOARDING_CONTRACT_ID: &str = "first-contract";

/// Filter and slim down contracts from a fresh fetch.
///
/// Graded contracts carry their goals inside the grade specs, so the legacy
/// goal lists are dropped before storage.
pub fn prepare_active_contracts(contracts: Vec<Contract>) -> Vec<Contract> {
    contracts
        .into_iter()
        .filter(|contract| contract.identifier() != ONBOARDING_CONTRACT_ID)
        .map(|mut contract| {
            if !contract.grade_specs.is_empty() {
                contract.goals.clear();
                contract.goal_sets.clear();
            }
            contract
        })
        .collect()
}

/// Result of merging fetched contracts into the stored catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractMerge {
    /// Stored contracts already expired at merge time, in stored order.
    pub old: Vec<Retained<Contract>>,
    /// Fresh and still-running stored contracts, unique and sorted by start.
    pub merged: Vec<Retained<Contract>>,
}

impl ContractMerge {
    pub fn all(&self) -> impl Iterator<Item = &Retained<Contract>> {
        self.old.iter().chain(self.merged.iter())
    }

    pub fn len(&self) -> usize {
        self.old.len() + self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Catalog records; stored contracts keep their original blob.
    pub fn records(&self) -> Vec<BlobRecord> {
        self.all().map(Retained::record).collect()
    }

    /// Contracts belonging to `season_id`, in catalog order.
    pub fn season_projection(&self, season_id: &str) -> Vec<BlobRecord> {
        self.all()
            .filter(|contract| contract.season_id() == season_id)
            .map(Retained::record)
            .collect()
    }
}

/// Merge fetched contracts with stored blobs.
///
/// Stored contracts that expired at or before `now` are frozen in the `old`
/// segment: they are never overridden, and a fetched contract sharing their
/// identity is discarded. Still-running stored contracts are replaced by a
/// fetched contract with the same identity. Any undecodable stored record
/// aborts the merge.
pub fn merge_contracts(
    active: Vec<Contract>,
    persisted: &[BlobRecord],
    now: f64,
) -> Result<ContractMerge, RecordDecodeError> {
    let active = prepare_active_contracts(active);

    let past = decode_records::<Contract>(persisted)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let (old, recent): (Vec<Retained<Contract>>, Vec<Retained<Contract>>) = past
        .into_iter()
        .partition(|contract| contract.expiration_time() <= now);

    let mut candidates: Vec<Retained<Contract>> = {
        let frozen: HashSet<&str> = old.iter().map(|contract| contract.identity()).collect();
        active
            .into_iter()
            .filter(|contract| {
                let expired_copy = frozen.contains(contract.identity());
                if expired_copy {
                    tracing::debug!(
                        target: "periodicals::merge",
                        contract = contract.identity(),
                        "contract.skipped=already_expired"
                    );
                }
                !expired_copy
            })
            .map(Retained::fresh)
            .collect()
    };
    candidates.extend(recent);

    let mut merged = unique_by_identity(candidates);
    sort_by_start_time(&mut merged);

    Ok(ContractMerge { old, merged })
}

/// Merge fetched contracts into the contract catalog and, when a season is
/// running, refresh that season's projection file.
pub fn update_contracts(
    paths: &PathsConfig,
    active: &[Contract],
    current_season: &str,
    now: f64,
) -> Result<MergeSummary, MergeError> {
    let persisted: Vec<BlobRecord> = read_collection(paths.contract_file())?;
    let merge = merge_contracts(active.to_vec(), &persisted, now)?;

    if !current_season.is_empty() {
        let season_contracts = merge.season_projection(current_season);
        if season_contracts.is_empty() {
            tracing::info!(
                target: "periodicals::merge",
                season = current_season,
                "season_contracts.skipped=empty"
            );
        } else {
            write_collection(paths.season_contract_file(), &season_contracts)?;
            tracing::info!(
                target: "periodicals::merge",
                season = current_season,
                contracts = season_contracts.len(),
                "season_contracts.written"
            );
        }
    }

    let records = merge.records();
    write_collection(paths.contract_file(), &records)?;

    Ok(MergeSummary::new(
        Collection::Contracts,
        active.len(),
        persisted.len(),
        records.len(),
    ))
}
