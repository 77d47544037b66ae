//! Statistics snapshot and type-distribution bucketing
//!
//! Statistics are derived on demand from a user's file records and never
//! stored. The distribution keeps the [`TOP_TYPES`] most frequent MIME types
//! and folds every remaining type into a single [`OTHER_LABEL`] bucket.

use serde::Serialize;

use super::newtypes::TotalBytes;

/// Number of MIME types reported individually
pub const TOP_TYPES: usize = 5;

/// Label of the synthetic bucket holding every type beyond the top ones
pub const OTHER_LABEL: &str = "Other";

/// Raw aggregates read from the store in one consistent pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAggregates {
    pub total_size: TotalBytes,
    pub file_count: u64,
    /// Occurrences per exact MIME type string, in any order
    pub mime_counts: Vec<(String, u64)>,
}

/// One entry of the type distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeShare {
    pub mime_type: String,
    pub count: u64,
    /// `round(100 * count / fileCount)`, half rounding up
    pub percentage: u32,
}

/// Statistics for one user's files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_storage: TotalBytes,
    pub file_count: u64,
    pub type_distribution: Vec<TypeShare>,
}

impl StatsSnapshot {
    /// Builds the snapshot from raw aggregates
    pub fn from_aggregates(aggregates: FileAggregates) -> Self {
        let type_distribution = type_distribution(aggregates.mime_counts, aggregates.file_count);
        Self {
            total_storage: aggregates.total_size,
            file_count: aggregates.file_count,
            type_distribution,
        }
    }
}

/// Rounds `100 * count / total` to the nearest integer, halves rounding up.
///
/// Returns 0 when `total` is 0.
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = u128::from(count);
    let total = u128::from(total);
    let rounded = (200 * count + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Buckets per-type counts into the top [`TOP_TYPES`] plus an "Other" entry.
///
/// Types are ordered by count descending; equal counts are ordered by MIME
/// type so that the result does not depend on the order of `mime_counts`.
/// An empty list is returned when `file_count` is 0.
pub fn type_distribution(mut mime_counts: Vec<(String, u64)>, file_count: u64) -> Vec<TypeShare> {
    if file_count == 0 {
        return Vec::new();
    }

    mime_counts.sort_by(|(a_type, a_count), (b_type, b_count)| {
        b_count.cmp(a_count).then_with(|| a_type.cmp(b_type))
    });

    let rest = if mime_counts.len() > TOP_TYPES {
        mime_counts.split_off(TOP_TYPES)
    } else {
        Vec::new()
    };

    let mut shares: Vec<TypeShare> = mime_counts
        .into_iter()
        .map(|(mime_type, count)| TypeShare {
            mime_type,
            count,
            percentage: percentage(count, file_count),
        })
        .collect();

    if !rest.is_empty() {
        let other: u64 = rest.iter().map(|(_, count)| count).sum();
        shares.push(TypeShare {
            mime_type: OTHER_LABEL.to_string(),
            count: other,
            percentage: percentage(other, file_count),
        });
    }

    shares
}
