//! Data types used by the aggregation pipeline.

use crate::analyzers::severity::{ClassCounts, ClassShares, SeverityClass};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// One hourly row of a city file that passed the completeness filter.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub year: i32,
    pub month: u32,
    /// Only loaded for the daily comparison.
    pub day: Option<u32>,
    /// Reference-authority concentration, when that column was requested.
    pub reference: Option<f64>,
    pub region_values: BTreeMap<String, f64>,
}

impl MeasurementRecord {
    pub fn region_value(&self, region: &str) -> Option<f64> {
        self.region_values.get(region).copied()
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day?)
    }
}

/// Rows of one city file, in file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub city: String,
    /// Station names in configuration order.
    pub regions: Vec<String>,
    pub records: Vec<MeasurementRecord>,
    /// Data rows seen in the file, including dropped ones.
    pub rows_read: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Grouping key of the daily comparison. Orders by city name, then calendar date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub city: String,
    pub date: NaiveDate,
}

/// Per-station mean concentration for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStat {
    pub period: MonthKey,
    /// `(region, mean)` in configuration order.
    pub region_means: Vec<(String, f64)>,
}

impl MonthlyStat {
    pub fn mean_for(&self, region: &str) -> Option<f64> {
        self.region_means
            .iter()
            .find(|(r, _)| r == region)
            .map(|(_, m)| *m)
    }
}

/// Hourly share of each severity class for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityShares {
    pub city: String,
    pub shares: ClassShares,
}

/// One hourly observation seen by both authorities.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyComparison {
    pub city: String,
    pub date: NaiveDate,
    /// Mean of the national stations.
    pub national: f64,
    pub reference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStat {
    pub city: String,
    pub date: NaiveDate,
    pub national: f64,
    pub reference: f64,
    pub national_class: SeverityClass,
    pub reference_class: SeverityClass,
}

/// Days per severity class for one city, per authority.
#[derive(Debug, Clone, PartialEq)]
pub struct CityTally {
    pub city: String,
    pub national: ClassCounts,
    pub reference: ClassCounts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    pub cities: Vec<CityTally>,
}

impl ComparisonTable {
    pub fn city(&self, name: &str) -> Option<&CityTally> {
        self.cities.iter().find(|t| t.city == name)
    }
}

/// Formats a date as `Y-M-D` without zero padding, e.g. `2013-3-7`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%-m-%-d").to_string()
}
