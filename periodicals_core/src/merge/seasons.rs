use periodicals_runtime::proto::{ContractSeasonInfo, ContractSeasonInfos};
use periodicals_runtime::BlobRecord;

use super::{decode_records, sort_by_start_time, unique_by_identity, MergeError, Retained};
use crate::config::PathsConfig;
use crate::metrics::{Collection, MergeSummary};
use crate::store::{read_collection, write_collection};

/// Start times for early seasons the service published without one.
pub const SEASON_START_BACKFILL: [(&str, f64); 4] = [
    ("fall_2023", 1_695_657_600.0),
    ("winter_2024", 1_703_610_000.0),
    ("spring_2024", 1_711_382_400.0),
    ("summer_2024", 1_719_244_800.0),
];

pub fn backfill_season_start_times(seasons: &mut [ContractSeasonInfo]) {
    for season in seasons.iter_mut() {
        if season.start_time() != 0.0 {
            continue;
        }
        if let Some((_, start)) = SEASON_START_BACKFILL
            .iter()
            .find(|(id, _)| *id == season.id())
        {
            season.start_time = Some(*start);
        }
    }
}

/// Merge fetched season infos with stored blobs.
///
/// Unlike contracts, a stored season that fails to decode is skipped with a
/// warning instead of failing the merge.
pub fn merge_seasons(
    mut active: Vec<ContractSeasonInfo>,
    persisted: &[BlobRecord],
) -> Vec<Retained<ContractSeasonInfo>> {
    backfill_season_start_times(&mut active);
    let mut candidates: Vec<Retained<ContractSeasonInfo>> =
        active.into_iter().map(Retained::fresh).collect();

    let stored = decode_records::<ContractSeasonInfo>(persisted)
        .into_iter()
        .filter_map(|slot| match slot {
            Ok(season) => Some(season),
            Err(err) => {
                tracing::warn!(
                    target: "periodicals::merge",
                    season = %err.id,
                    error = %err.source,
                    "season.skipped=undecodable"
                );
                None
            }
        });
    candidates.extend(stored);

    let mut seasons = unique_by_identity(candidates);
    sort_by_start_time(&mut seasons);
    seasons
}

pub fn update_contract_seasons(
    paths: &PathsConfig,
    infos: ContractSeasonInfos,
) -> Result<MergeSummary, MergeError> {
    let path = paths.contract_season_file();
    let persisted: Vec<BlobRecord> = read_collection(path)?;
    let fresh = infos.infos.len();

    let seasons = merge_seasons(infos.infos, &persisted);
    let records: Vec<BlobRecord> = seasons.iter().map(Retained::record).collect();
    write_collection(path, &records)?;

    Ok(MergeSummary::new(
        Collection::ContractSeasons,
        fresh,
        persisted.len(),
        records.len(),
    ))
}
