use crate::analyzers::reconcile::regional_mean_as_authority_value;
use crate::analyzers::types::{Dataset, MeasurementRecord, MonthKey, MonthlyStat};
use crate::analyzers::utility::mean;
use std::collections::BTreeMap;
use tracing::warn;

/// Means of several value fields over the rows sharing one period key.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary<K> {
    pub key: K,
    pub rows: usize,
    /// One entry per value field, in the order the fields were given.
    pub means: Vec<f64>,
}

/// Groups `rows` by `period` and averages each value field within a group.
///
/// `values` returns one slot per field, or `None` when the row is incomplete.
/// Incomplete rows and rows whose field count differs from the first accepted
/// row are skipped, never shifted into another column. Groups come out in
/// ascending key order, so the output does not depend on row order.
pub fn aggregate_by_period<'a, T, K, P, V>(
    rows: impl IntoIterator<Item = &'a T>,
    period: P,
    values: V,
) -> Vec<PeriodSummary<K>>
where
    T: 'a,
    K: Ord,
    P: Fn(&T) -> K,
    V: Fn(&T) -> Option<Vec<f64>>,
{
    let mut width: Option<usize> = None;
    let mut groups: BTreeMap<K, Vec<Vec<f64>>> = BTreeMap::new();

    for row in rows {
        let Some(fields) = values(row) else {
            continue;
        };
        let width = *width.get_or_insert(fields.len());
        if fields.len() != width {
            warn!(expected = width, found = fields.len(), "Skipping row with wrong field count");
            continue;
        }
        let series = groups
            .entry(period(row))
            .or_insert_with(|| vec![Vec::new(); width]);
        for (column, value) in series.iter_mut().zip(fields) {
            column.push(value);
        }
    }

    groups
        .into_iter()
        .map(|(key, series)| PeriodSummary {
            key,
            rows: series.first().map_or(0, Vec::len),
            // every column of a group holds one value per accepted row
            means: series.iter().filter_map(|s| mean(s)).collect(),
        })
        .collect()
}

/// Per-station mean concentration for every (year, month) in the dataset.
///
/// Records lacking any configured station are left out of every mean.
pub fn monthly_region_means(dataset: &Dataset) -> Vec<MonthlyStat> {
    aggregate_by_period(
        &dataset.records,
        |r: &MeasurementRecord| r.month_key(),
        |r: &MeasurementRecord| {
            dataset
                .regions
                .iter()
                .map(|region| r.region_value(region))
                .collect::<Option<Vec<f64>>>()
        },
    )
    .into_iter()
    .map(|summary: PeriodSummary<MonthKey>| MonthlyStat {
        period: summary.key,
        region_means: dataset.regions.iter().cloned().zip(summary.means).collect(),
    })
    .collect()
}

/// City-wide value of every hour: the mean over all stations of the row.
pub fn hourly_city_values(dataset: &Dataset) -> Vec<f64> {
    dataset
        .records
        .iter()
        .filter_map(|r| regional_mean_as_authority_value(r, &dataset.regions))
        .collect()
}
