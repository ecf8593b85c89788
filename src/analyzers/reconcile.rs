//! Cross-source comparison between the national stations of a city and the
//! reference (consulate) monitor.
//!
//! Hourly rows are reduced to one representative value per authority, averaged
//! per (city, date), joined, classified and finally tallied per city.

use crate::analyzers::aggregate::aggregate_by_period;
use crate::analyzers::severity::{ClassCounts, SeverityThresholds};
use crate::analyzers::types::{
    ComparisonTable, CityTally, DailyStat, Dataset, DayKey, HourlyComparison, MeasurementRecord,
};
use crate::analyzers::utility::mean;
use crate::error::PipelineResult;
use std::collections::BTreeMap;

/// National-authority value of one hour: the mean over the listed stations.
///
/// `None` if the list is empty or a station has no value in this record.
pub fn regional_mean_as_authority_value(
    record: &MeasurementRecord,
    regions: &[String],
) -> Option<f64> {
    let values = regions
        .iter()
        .map(|r| record.region_value(r))
        .collect::<Option<Vec<f64>>>()?;
    mean(&values)
}

/// Pairs each hourly national value with the reference reading of the same row.
pub fn hourly_comparisons(dataset: &Dataset) -> Vec<HourlyComparison> {
    dataset
        .records
        .iter()
        .filter_map(|r| {
            Some(HourlyComparison {
                city: dataset.city.clone(),
                date: r.date()?,
                national: regional_mean_as_authority_value(r, &dataset.regions)?,
                reference: r.reference?,
            })
        })
        .collect()
}

/// Daily mean concentration per authority, keyed by (city, date).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyMeans {
    pub national: BTreeMap<DayKey, f64>,
    pub reference: BTreeMap<DayKey, f64>,
}

pub fn daily_means(rows: &[HourlyComparison]) -> DailyMeans {
    let mut means = DailyMeans::default();
    let summaries = aggregate_by_period(
        rows,
        |r: &HourlyComparison| DayKey {
            city: r.city.clone(),
            date: r.date,
        },
        |r: &HourlyComparison| Some(vec![r.national, r.reference]),
    );
    for summary in summaries {
        if let [national, reference] = summary.means[..] {
            means.national.insert(summary.key.clone(), national);
            means.reference.insert(summary.key, reference);
        }
    }
    means
}

/// Joins both authorities' daily means and classifies each.
///
/// A (city, date) present for only one authority is left out. Output is
/// ordered by city name, then date.
pub fn join_daily(
    means: &DailyMeans,
    thresholds: &SeverityThresholds,
) -> PipelineResult<Vec<DailyStat>> {
    let mut stats = Vec::with_capacity(means.national.len());
    for (key, &national) in &means.national {
        let Some(&reference) = means.reference.get(key) else {
            continue;
        };
        stats.push(DailyStat {
            city: key.city.clone(),
            date: key.date,
            national,
            reference,
            national_class: thresholds.classify(national)?,
            reference_class: thresholds.classify(reference)?,
        });
    }
    Ok(stats)
}

/// Counts days per severity class for each city and authority.
///
/// `cities` fixes the column order: every listed city appears, in that order,
/// even without any day. Cities not listed follow in the order first seen.
/// Every class is counted, so classes without any day read as zero.
pub fn tally_by_class<S: AsRef<str>>(daily: &[DailyStat], cities: &[S]) -> ComparisonTable {
    let empty = |city: &str| CityTally {
        city: city.to_string(),
        national: ClassCounts::default(),
        reference: ClassCounts::default(),
    };
    let mut table = ComparisonTable {
        cities: cities.iter().map(|c| empty(c.as_ref())).collect(),
    };
    for stat in daily {
        let idx = match table.cities.iter().position(|t| t.city == stat.city) {
            Some(idx) => idx,
            None => {
                table.cities.push(empty(&stat.city));
                table.cities.len() - 1
            }
        };
        let tally = &mut table.cities[idx];
        tally.national.add(stat.national_class);
        tally.reference.add(stat.reference_class);
    }
    table
}
