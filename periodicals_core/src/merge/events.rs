use periodicals_runtime::proto::EggIncEvent;
use periodicals_runtime::EventRecord;

use super::MergeError;
use crate::config::PathsConfig;
use crate::metrics::{Collection, MergeSummary};
use crate::store::{read_collection, write_collection};

pub fn event_record_from_proto(event: &EggIncEvent) -> EventRecord {
    EventRecord {
        end_timestamp: event.start_time() + event.duration(),
        id: event.identifier().to_string(),
        message: event.subtitle().to_string(),
        multiplier: event.multiplier(),
        start_timestamp: event.start_time(),
        kind: event.r#type().to_string(),
        ultra: event.cc_only(),
    }
}

/// Merge active events into the event history.
///
/// History is kept forever. A past event is replaced when an active event is
/// the same occurrence; the active events, ordered by start then id, always
/// follow the retained history.
pub fn merge_events(active: &[EggIncEvent], past: Vec<EventRecord>) -> Vec<EventRecord> {
    let mut fresh: Vec<EventRecord> = active.iter().map(event_record_from_proto).collect();
    fresh.sort_by(|a, b| {
        a.start_timestamp
            .total_cmp(&b.start_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut merged: Vec<EventRecord> = past
        .into_iter()
        .filter(|old| !fresh.iter().any(|new| new.is_same_occurrence(old)))
        .collect();
    merged.extend(fresh);
    merged
}

pub fn update_events(
    paths: &PathsConfig,
    active: &[EggIncEvent],
) -> Result<MergeSummary, MergeError> {
    let path = paths.event_file();
    let past: Vec<EventRecord> = read_collection(path)?;
    let persisted = past.len();

    let merged = merge_events(active, past);
    write_collection(path, &merged)?;

    Ok(MergeSummary::new(
        Collection::Events,
        active.len(),
        persisted,
        merged.len(),
    ))
}
