//! End-to-end runs.
//!
//! Each city is loaded and reduced on its own blocking task, bounded by
//! `max_concurrent_cities`. Results are gathered in configuration order
//! before any cross-city step, and nothing is written unless every city
//! succeeded.

use crate::analyzers::aggregate::{hourly_city_values, monthly_region_means};
use crate::analyzers::reconcile::{daily_means, hourly_comparisons, join_daily, tally_by_class};
use crate::analyzers::severity::ClassShares;
use crate::analyzers::types::{
    CityShares, ComparisonTable, DailyStat, Dataset, HourlyComparison, MonthlyStat,
};
use crate::config::{ensure_dir, AppConfig, CityConfig};
use crate::error::PipelineError;
use crate::loader::RecordLoader;
use crate::output;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// Monthly stats and hourly severity shares of one city.
#[derive(Debug, Clone)]
pub struct CityMonthly {
    pub city: String,
    pub regions: Vec<String>,
    pub shares: ClassShares,
    pub monthly: Vec<MonthlyStat>,
}

#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub cities: Vec<CityMonthly>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub hourly_rows: usize,
    pub daily: Vec<DailyStat>,
    pub table: ComparisonTable,
    pub files: Vec<PathBuf>,
}

/// Runs `job` for every configured city and returns the results in
/// configuration order. The first failure is returned once all jobs ended.
async fn run_per_city<T, F>(config: &Arc<AppConfig>, job: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&AppConfig, &CityConfig) -> Result<T> + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_cities));
    let job = Arc::new(job);
    let mut tasks = Vec::with_capacity(config.cities.len());

    for idx in 0..config.cities.len() {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        let job = job.clone();
        let span = tracing::info_span!("city_job", city = %config.cities[idx].name);

        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _entered = span.enter();
            job(config.as_ref(), &config.cities[idx])
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    let mut first_error = None;

    for (task, city) in tasks.into_iter().zip(&config.cities) {
        match task.await? {
            Ok(value) => results.push(value),
            Err(e) => {
                error!(city = %city.name, error = %format!("{e:#}"), "City job failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

fn load_checked(loader: RecordLoader<'_>, config: &AppConfig, city: &CityConfig) -> Result<Dataset> {
    let path = config.city_file(city);
    let dataset = loader
        .load()
        .with_context(|| format!("loading {} for city '{}'", path.display(), city.name))?;

    info!(
        city = %city.name,
        rows_read = dataset.rows_read,
        rows_valid = dataset.len(),
        "Loaded city data"
    );
    for record in dataset.records.iter().take(10) {
        debug!(city = %city.name, ?record, "Preview row");
    }

    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset {
            city: city.name.clone(),
        })
        .with_context(|| format!("no usable rows in {}", path.display()));
    }
    Ok(dataset)
}

fn monthly_city_job(config: &AppConfig, city: &CityConfig) -> Result<CityMonthly> {
    let dataset = load_checked(RecordLoader::monthly(config, city), config, city)?;

    let hourly = hourly_city_values(&dataset);
    let shares = config
        .thresholds
        .percentage_by_class(&hourly)
        .with_context(|| format!("pollution shares for city '{}'", city.name))?;
    info!(
        city = %city.name,
        heavy = shares.heavy,
        medium = shares.medium,
        light = shares.light,
        good = shares.good,
        "Hourly pollution shares"
    );

    let monthly = monthly_region_means(&dataset);
    debug!(city = %city.name, months = monthly.len(), "Monthly means computed");

    Ok(CityMonthly {
        city: city.name.clone(),
        regions: city.regions.clone(),
        shares,
        monthly,
    })
}

/// Monthly per-station means and hourly severity shares for every city.
#[tracing::instrument(skip_all, fields(output = %config.output_path.display()))]
pub async fn run_monthly(config: Arc<AppConfig>) -> Result<MonthlyReport> {
    let cities = run_per_city(&config, monthly_city_job).await?;

    ensure_dir(&config.output_path)?;
    let mut files = Vec::new();

    for c in &cities {
        let path = config.output_path.join(output::month_stats_file(&c.city));
        output::write_monthly_stats(&path, &c.regions, &c.monthly)?;
        info!(city = %c.city, path = %path.display(), "Monthly stats saved");
        files.push(path);
    }

    let shares: Vec<CityShares> = cities
        .iter()
        .map(|c| CityShares {
            city: c.city.clone(),
            shares: c.shares,
        })
        .collect();
    let path = config.output_path.join(output::POLLUTED_PERCENTAGE_FILE);
    output::write_pollution_shares(&path, &shares)?;
    info!(path = %path.display(), "Pollution shares saved");
    files.push(path);

    Ok(MonthlyReport { cities, files })
}

fn comparison_city_job(config: &AppConfig, city: &CityConfig) -> Result<Vec<HourlyComparison>> {
    let dataset = load_checked(RecordLoader::daily(config, city), config, city)?;
    Ok(hourly_comparisons(&dataset))
}

/// Daily national vs. reference means, their severity classes, and the
/// per-city count of days in each class.
#[tracing::instrument(skip_all, fields(output = %config.comparison_output_path.display()))]
pub async fn run_comparison(config: Arc<AppConfig>) -> Result<ComparisonReport> {
    let per_city = run_per_city(&config, comparison_city_job).await?;
    let hourly: Vec<HourlyComparison> = per_city.into_iter().flatten().collect();

    let means = daily_means(&hourly);
    let daily = join_daily(&means, &config.thresholds)?;
    let city_order: Vec<&str> = config.cities.iter().map(|c| c.name.as_str()).collect();
    let table = tally_by_class(&daily, &city_order);
    info!(
        hourly_rows = hourly.len(),
        days = daily.len(),
        cities = table.cities.len(),
        "Daily comparison computed"
    );

    let dir = &config.comparison_output_path;
    ensure_dir(dir)?;
    let files = vec![
        dir.join(output::ALL_CITIES_FILE),
        dir.join(output::DAY_STATS_FILE),
        dir.join(output::COMPARISON_FILE),
    ];
    output::write_hourly_comparisons(&files[0], &hourly)?;
    output::write_daily_stats(&files[1], &daily)?;
    output::write_comparison_table(&files[2], &table)?;
    for f in &files {
        info!(path = %f.display(), "Comparison result saved");
    }

    Ok(ComparisonReport {
        hourly_rows: hourly.len(),
        daily,
        table,
        files,
    })
}
