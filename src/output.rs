//! CSV report files.
//!
//! Every writer truncates its target, writes a fixed header and one row per
//! result. No timestamps or run metadata are written, so identical input
//! produces identical files.

use crate::analyzers::severity::{ClassShares, SeverityClass};
use crate::analyzers::types::{
    format_date, CityShares, ComparisonTable, DailyStat, HourlyComparison, MonthlyStat,
};
use crate::error::{PipelineError, PipelineResult};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub const POLLUTED_PERCENTAGE_FILE: &str = "polluted_percentage.csv";
pub const ALL_CITIES_FILE: &str = "all_cities_pm.csv";
pub const DAY_STATS_FILE: &str = "day_stats.csv";
pub const COMPARISON_FILE: &str = "comparison_result.csv";

pub fn month_stats_file(city: &str) -> String {
    format!("{city}_month_stats.csv")
}

fn create(path: &Path) -> PipelineResult<Writer<File>> {
    debug!(path = %path.display(), "Writing CSV report");
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(WriterBuilder::new().has_headers(true).from_writer(file))
}

fn finish(mut writer: Writer<File>, path: &Path) -> PipelineResult<()> {
    writer.flush().map_err(|e| PipelineError::io(path, e))
}

/// Header `month,<region...>`, one `YYYY-MM` row per month.
pub fn write_monthly_stats(
    path: &Path,
    regions: &[String],
    stats: &[MonthlyStat],
) -> PipelineResult<()> {
    let mut writer = create(path)?;
    let header = std::iter::once("month").chain(regions.iter().map(String::as_str));
    writer
        .write_record(header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for stat in stats {
        let mut row = vec![stat.period.to_string()];
        row.extend(
            regions
                .iter()
                .map(|r| stat.mean_for(r).map(|m| format!("{m:?}")).unwrap_or_default()),
        );
        writer
            .write_record(&row)
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    finish(writer, path)
}

#[derive(Serialize)]
struct SharesRow<'a> {
    city: &'a str,
    heavy: f64,
    medium: f64,
    light: f64,
    good: f64,
}

impl<'a> SharesRow<'a> {
    fn new(city: &'a str, shares: &ClassShares) -> Self {
        Self {
            city,
            heavy: shares.heavy,
            medium: shares.medium,
            light: shares.light,
            good: shares.good,
        }
    }
}

/// Header `city,heavy,medium,light,good`.
pub fn write_pollution_shares(path: &Path, shares: &[CityShares]) -> PipelineResult<()> {
    let mut writer = create(path)?;
    for s in shares {
        writer
            .serialize(SharesRow::new(&s.city, &s.shares))
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    finish(writer, path)
}

#[derive(Serialize)]
struct HourlyRow<'a> {
    date: String,
    city: &'a str,
    #[serde(rename = "PM_China")]
    national: f64,
    #[serde(rename = "PM_US Post")]
    reference: f64,
}

/// Header `date,city,PM_China,PM_US Post`, one row per valid hour.
pub fn write_hourly_comparisons(path: &Path, rows: &[HourlyComparison]) -> PipelineResult<()> {
    let mut writer = create(path)?;
    for r in rows {
        writer
            .serialize(HourlyRow {
                date: format_date(r.date),
                city: &r.city,
                national: r.national,
                reference: r.reference,
            })
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    finish(writer, path)
}

#[derive(Serialize)]
struct DailyRow<'a> {
    city: &'a str,
    date: String,
    #[serde(rename = "PM_China")]
    national: f64,
    #[serde(rename = "PM_US Post")]
    reference: f64,
    #[serde(rename = "Polluted State CH")]
    national_class: SeverityClass,
    #[serde(rename = "Polluted State US")]
    reference_class: SeverityClass,
}

pub fn write_daily_stats(path: &Path, stats: &[DailyStat]) -> PipelineResult<()> {
    let mut writer = create(path)?;
    for s in stats {
        writer
            .serialize(DailyRow {
                city: &s.city,
                date: format_date(s.date),
                national: s.national,
                reference: s.reference,
                national_class: s.national_class,
                reference_class: s.reference_class,
            })
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    finish(writer, path)
}

/// One row per severity class; a `<city>_CH` and `<city>_US` column per city.
pub fn write_comparison_table(path: &Path, table: &ComparisonTable) -> PipelineResult<()> {
    let mut writer = create(path)?;

    let mut header = vec!["state".to_string()];
    for t in &table.cities {
        header.push(format!("{}_CH", t.city));
        header.push(format!("{}_US", t.city));
    }
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for class in SeverityClass::ALL {
        let mut row = vec![class.to_string()];
        for t in &table.cities {
            row.push(t.national.get(class).to_string());
            row.push(t.reference.get(class).to_string());
        }
        writer
            .write_record(&row)
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    finish(writer, path)
}
