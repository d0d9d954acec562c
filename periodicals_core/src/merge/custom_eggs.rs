use periodicals_runtime::encode_blob;
use periodicals_runtime::proto::CustomEgg;

use super::MergeError;
use crate::config::PathsConfig;
use crate::metrics::{Collection, MergeSummary};
use crate::store::write_collection;

pub fn encode_custom_eggs(eggs: &[CustomEgg]) -> Vec<String> {
    eggs.iter().map(encode_blob).collect()
}

/// File name an egg's icon is saved under: `egg_<lowercase name, no spaces>.png`.
pub fn icon_file_name(name: &str) -> String {
    format!("egg_{}.png", name.to_lowercase().replace(' ', ""))
}

/// Replace the stored custom egg list with the fetched one.
///
/// An empty fetch leaves the stored list untouched.
pub fn update_custom_eggs(
    paths: &PathsConfig,
    eggs: &[CustomEgg],
) -> Result<MergeSummary, MergeError> {
    if eggs.is_empty() {
        tracing::error!(
            target: "periodicals::merge",
            "custom_eggs.missing"
        );
        return Ok(MergeSummary::new(Collection::CustomEggs, 0, 0, 0));
    }

    for egg in eggs {
        tracing::info!(target: "periodicals::merge", egg = egg.name(), "custom_egg.listed");
    }

    let encoded = encode_custom_eggs(eggs);
    write_collection(paths.custom_egg_file(), &encoded)?;

    Ok(MergeSummary::new(
        Collection::CustomEggs,
        eggs.len(),
        0,
        encoded.len(),
    ))
}
