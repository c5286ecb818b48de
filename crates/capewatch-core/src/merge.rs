//! Series merge engine.
//!
//! Joins the secondary and metric series onto the primary timeline. Each
//! primary observation yields exactly one [`MergedRecord`], in primary order.
//!
//! - Secondary values are matched by nearest timestamp within
//!   [`MATCH_TOLERANCE_MS`]; outside it the field is absent.
//! - Metric values carry forward: the most recent observation on or before
//!   the primary date. Primary dates earlier than the whole metric series are
//!   resolved by [`BoundaryFill`].

use serde::{Deserialize, Serialize};

use crate::{MergedRecord, Observation, PriceObservation};

/// One week. A secondary observation must be strictly closer than this.
pub const MATCH_TOLERANCE_MS: u64 = 604_800_000;

/// Metric value used only when the metric series is empty.
pub const METRIC_UNSET: f64 = 0.0;

/// Metric value borrowed by primary records that predate every metric
/// observation. Both variants look ahead in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryFill {
    /// Earliest available metric observation.
    #[default]
    Earliest,
    /// Most recent metric observation.
    Latest,
}

/// Merges with the default [`BoundaryFill::Earliest`].
pub fn merge(
    primary: &[PriceObservation],
    secondary: &[PriceObservation],
    metric: &[Observation],
) -> Vec<MergedRecord> {
    merge_with(primary, secondary, metric, BoundaryFill::default())
}

pub fn merge_with(
    primary: &[PriceObservation],
    secondary: &[PriceObservation],
    metric: &[Observation],
    boundary_fill: BoundaryFill,
) -> Vec<MergedRecord> {
    let mut metric_sorted = metric.to_vec();
    metric_sorted.sort_by_key(|observation| observation.date);

    let boundary_value = match boundary_fill {
        BoundaryFill::Earliest => metric_sorted.first(),
        BoundaryFill::Latest => metric_sorted.last(),
    }
    .map_or(METRIC_UNSET, |observation| observation.value);

    primary
        .iter()
        .map(|observation| {
            let carried = metric_sorted.partition_point(|m| m.date <= observation.date);
            let metric_value = carried
                .checked_sub(1)
                .map_or(boundary_value, |index| metric_sorted[index].value);

            MergedRecord {
                date: observation.date,
                primary_value: observation.close,
                secondary_value: nearest_within_tolerance(secondary, observation.timestamp),
                metric_value,
            }
        })
        .collect()
}

/// First observation at minimal distance from `timestamp`, if that distance
/// is inside the tolerance. Does not require `series` to be sorted.
fn nearest_within_tolerance(series: &[PriceObservation], timestamp: i64) -> Option<f64> {
    let mut best: Option<(u64, f64)> = None;
    for candidate in series {
        let distance = candidate.timestamp.abs_diff(timestamp);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, candidate.close));
        }
    }

    best.filter(|(distance, _)| *distance < MATCH_TOLERANCE_MS)
        .map(|(_, close)| close)
}
