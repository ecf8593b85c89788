//! CSV loading for per-city measurement files.
//!
//! Selects the grouping keys and concentration columns a pipeline needs,
//! parses every value, and drops rows where any concentration equals the
//! missing-value token. Anything else that is not a number is an error.

use crate::analyzers::types::{Dataset, MeasurementRecord};
use crate::config::{AppConfig, CityConfig};
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const YEAR: &str = "year";
const MONTH: &str = "month";
const DAY: &str = "day";

/// Loads one city's file with a fixed set of required columns.
pub struct RecordLoader<'a> {
    config: &'a AppConfig,
    city: &'a CityConfig,
    with_day: bool,
    with_reference: bool,
}

impl<'a> RecordLoader<'a> {
    /// `year, month` and one column per station.
    pub fn monthly(config: &'a AppConfig, city: &'a CityConfig) -> Self {
        Self {
            config,
            city,
            with_day: false,
            with_reference: false,
        }
    }

    /// `year, month, day`, the reference column and one column per station.
    pub fn daily(config: &'a AppConfig, city: &'a CityConfig) -> Self {
        Self {
            config,
            city,
            with_day: true,
            with_reference: true,
        }
    }

    /// Reads the city's file from the configured dataset directory.
    pub fn load(&self) -> PipelineResult<Dataset> {
        let path = self.config.city_file(self.city);
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        self.load_from_reader(file, &path)
    }

    /// `path` is only used to label errors.
    pub fn load_from_reader<R: Read>(&self, reader: R, path: &Path) -> PipelineResult<Dataset> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| PipelineError::csv(path, e))?
            .clone();
        let columns = self.resolve_columns(&headers, path)?;

        let mut records = Vec::new();
        let mut rows_read = 0;

        for (i, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| PipelineError::csv(path, e))?;
            rows_read += 1;
            let cells = RowCells {
                row: &row,
                row_number: i + 1,
                path,
                missing_token: &self.config.missing_token,
            };
            if let Some(record) = self.parse_row(&cells, &columns)? {
                records.push(record);
            }
        }

        Ok(Dataset {
            city: self.city.name.clone(),
            regions: self.city.regions.clone(),
            records,
            rows_read,
        })
    }

    fn resolve_columns(&self, headers: &StringRecord, path: &Path) -> PipelineResult<Columns> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        };

        let day = if self.with_day { Some(find(DAY)?) } else { None };
        let reference = if self.with_reference {
            let name = &self.config.reference_column;
            Some((name.clone(), find(name.as_str())?))
        } else {
            None
        };
        let regions = self
            .city
            .regions
            .iter()
            .map(|r| {
                let column = self.config.region_column(r);
                let idx = find(column.as_str())?;
                Ok(RegionColumn {
                    region: r.clone(),
                    column,
                    idx,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Columns {
            year: find(YEAR)?,
            month: find(MONTH)?,
            day,
            reference,
            regions,
        })
    }

    /// Returns `None` when the row has a missing concentration.
    fn parse_row(
        &self,
        cells: &RowCells<'_>,
        columns: &Columns,
    ) -> PipelineResult<Option<MeasurementRecord>> {
        let year: i32 = cells.key(columns.year, YEAR)?;
        let month: u32 = cells.key(columns.month, MONTH)?;
        if !(1..=12).contains(&month) {
            return Err(cells.malformed(columns.month, MONTH));
        }
        let day = match columns.day {
            Some(idx) => {
                let day: u32 = cells.key(idx, DAY)?;
                if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                    return Err(cells.malformed(idx, DAY));
                }
                Some(day)
            }
            None => None,
        };

        // Every cell is parsed before deciding to drop, so a malformed value
        // is reported even when the row also has a missing one.
        let reference = match &columns.reference {
            Some((name, idx)) => Some(cells.value(*idx, name)?),
            None => None,
        };
        let mut complete = !matches!(reference, Some(None));

        let mut region_values = BTreeMap::new();
        for rc in &columns.regions {
            match cells.value(rc.idx, &rc.column)? {
                Some(v) => {
                    region_values.insert(rc.region.clone(), v);
                }
                None => complete = false,
            }
        }

        if !complete {
            return Ok(None);
        }

        Ok(Some(MeasurementRecord {
            year,
            month,
            day,
            reference: reference.flatten(),
            region_values,
        }))
    }
}

struct RegionColumn {
    region: String,
    column: String,
    idx: usize,
}

struct Columns {
    year: usize,
    month: usize,
    day: Option<usize>,
    reference: Option<(String, usize)>,
    regions: Vec<RegionColumn>,
}

struct RowCells<'r> {
    row: &'r StringRecord,
    row_number: usize,
    path: &'r Path,
    missing_token: &'r str,
}

impl RowCells<'_> {
    fn raw(&self, idx: usize) -> &str {
        self.row.get(idx).unwrap_or("")
    }

    fn malformed(&self, idx: usize, column: &str) -> PipelineError {
        PipelineError::MalformedInput {
            path: self.path.to_path_buf(),
            row: self.row_number,
            column: column.to_string(),
            value: self.raw(idx).to_string(),
        }
    }

    /// Grouping keys may never be missing.
    fn key<T: std::str::FromStr>(&self, idx: usize, column: &str) -> PipelineResult<T> {
        self.raw(idx)
            .parse()
            .map_err(|_| self.malformed(idx, column))
    }

    fn value(&self, idx: usize, column: &str) -> PipelineResult<Option<f64>> {
        let raw = self.raw(idx);
        if raw == self.missing_token {
            return Ok(None);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.malformed(idx, column)),
        }
    }
}
