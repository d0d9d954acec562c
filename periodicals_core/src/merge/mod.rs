//! Reconciliation of freshly fetched entities with the persisted catalog.
//!
//! Every merge concatenates fresh entries before persisted ones and keeps the
//! first occurrence of each identity, so precedence is decided purely by
//! concatenation order.
//!
//! Persisted entries that survive a merge are written back as the exact blob
//! they were read from. Only fresh entries are encoded, so fields the local
//! schema does not model are never stripped from the catalog.

pub mod contracts;
pub mod custom_eggs;
pub mod events;
pub mod seasons;

use std::collections::HashSet;
use std::ops::Deref;
use std::time::{SystemTime, UNIX_EPOCH};

use periodicals_runtime::{decode_record, BlobRecord, CatalogEntry, RecordDecodeError, Scheduled};
use rayon::prelude::*;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Record(#[from] RecordDecodeError),
}

/// A catalog entry paired with the stored blob it was decoded from.
///
/// Fresh entries have no stored blob and are encoded on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Retained<T> {
    pub entry: T,
    pub stored: Option<BlobRecord>,
}

impl<T: CatalogEntry> Retained<T> {
    pub fn fresh(entry: T) -> Self {
        Self {
            entry,
            stored: None,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.stored.is_some()
    }

    /// The record to persist: the original blob when there is one.
    pub fn record(&self) -> BlobRecord {
        match &self.stored {
            Some(record) => record.clone(),
            None => self.entry.to_record(),
        }
    }
}

impl<T> Deref for Retained<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entry
    }
}

/// Decode persisted blobs in parallel.
///
/// Slot `i` of the result holds the outcome for `records[i]`, whatever order
/// the workers finish in.
pub fn decode_records<M>(records: &[BlobRecord]) -> Vec<Result<Retained<M>, RecordDecodeError>>
where
    M: CatalogEntry + Send,
{
    records
        .par_iter()
        .map(|record| {
            decode_record::<M>(record).map(|entry| Retained {
                entry,
                stored: Some(record.clone()),
            })
        })
        .collect()
}

/// Keep the first entry for each identity.
pub fn unique_by_identity<T: CatalogEntry>(mut entries: Vec<Retained<T>>) -> Vec<Retained<T>> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries.retain(|retained| seen.insert(retained.identity().to_owned()));
    entries
}

/// Stable sort by start time; entries sharing a start keep their relative order.
pub fn sort_by_start_time<T: Scheduled>(entries: &mut [Retained<T>]) {
    entries.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
}

/// Current wall-clock time in Unix seconds, the unit the service uses.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use periodicals_runtime::proto::ContractSeasonInfo;

    use super::*;

    fn season(id: &str, name: &str, start: f64) -> ContractSeasonInfo {
        ContractSeasonInfo {
            id: Some(id.into()),
            name: Some(name.into()),
            start_time: Some(start),
            ..Default::default()
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let unique = unique_by_identity(vec![
            Retained::fresh(season("a", "fresh", 1.0)),
            Retained::fresh(season("b", "only", 2.0)),
            Retained::fresh(season("a", "stale", 1.0)),
        ]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name(), "fresh");
    }

    #[test]
    fn sort_is_stable_for_equal_starts() {
        let mut seasons: Vec<Retained<ContractSeasonInfo>> = vec![
            season("late", "", 20.0),
            season("x", "", 10.0),
            season("y", "", 10.0),
        ]
        .into_iter()
        .map(Retained::fresh)
        .collect();
        sort_by_start_time(&mut seasons);
        let ids: Vec<&str> = seasons.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["x", "y", "late"]);
    }

    #[test]
    fn decoded_slots_follow_input_order() {
        let mut records: Vec<BlobRecord> = (0..64)
            .map(|i| season(&format!("s{i}"), "", i as f64).to_record())
            .collect();
        records[7].proto = "!!".into();

        let decoded = decode_records::<ContractSeasonInfo>(&records);
        assert_eq!(decoded.len(), 64);
        for (index, slot) in decoded.iter().enumerate() {
            match slot {
                Ok(season) => {
                    assert_eq!(season.id(), format!("s{index}"));
                    assert_eq!(season.stored.as_ref(), Some(&records[index]));
                }
                Err(err) => {
                    assert_eq!(index, 7);
                    assert_eq!(err.id, "s7");
                }
            }
        }
    }
}
