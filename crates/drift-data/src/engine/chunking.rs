use std::collections::BTreeMap;

use drift_core::config::ChunkPeriod;
use drift_core::models::{ChunkInfo, DataPeriod, Dataset, EventRecord};
use drift_core::time_utils::month_key;

/// Records of one time bucket, borrowed from their [`Dataset`].
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub info: ChunkInfo,
    pub records: Vec<&'a EventRecord>,
}

/// Split a dataset into buckets of the configured period.
pub fn chunk_dataset(
    dataset: &Dataset,
    period: ChunkPeriod,
    data_period: DataPeriod,
) -> Vec<Chunk<'_>> {
    match period {
        ChunkPeriod::Month => chunk_by_month(dataset, data_period),
    }
}

/// Group records by local calendar month in the dataset's timezone.
///
/// Chunks are returned in chronological order; empty months are skipped.
/// `start` and `end` are the first and last timestamps seen in the chunk.
pub fn chunk_by_month(dataset: &Dataset, data_period: DataPeriod) -> Vec<Chunk<'_>> {
    let mut buckets: BTreeMap<String, Vec<&EventRecord>> = BTreeMap::new();
    for record in &dataset.records {
        buckets
            .entry(month_key(record.timestamp, dataset.timezone))
            .or_default()
            .push(record);
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, (key, records))| {
            let start = records.iter().map(|r| r.timestamp).min().unwrap_or_default();
            let end = records.iter().map(|r| r.timestamp).max().unwrap_or_default();
            Chunk {
                info: ChunkInfo {
                    key,
                    index,
                    start,
                    end,
                    period: data_period,
                    size: records.len(),
                },
                records,
            }
        })
        .collect()
}
