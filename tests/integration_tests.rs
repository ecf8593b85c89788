use pm25_rater::analyzers::severity::SeverityClass;
use pm25_rater::config::{AppConfig, CityConfig};
use pm25_rater::error::PipelineError;
use pm25_rater::pipeline::{run_comparison, run_monthly};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const HEADER: &str = "No,year,month,day,hour,season,PM_A,PM_B,PM_US Post,TEMP";

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pm25_rater_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("data")).unwrap();
    dir
}

fn config_for(dir: &Path, cities: &[&str]) -> AppConfig {
    AppConfig {
        dataset_path: dir.join("data"),
        output_path: dir.join("output"),
        comparison_output_path: dir.join("output2"),
        cities: cities
            .iter()
            .map(|c| CityConfig::new(c, &format!("{c}.csv"), &["A", "B"]))
            .collect(),
        ..AppConfig::default()
    }
}

fn write_city(dir: &Path, city: &str, rows: &[String]) {
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(dir.join("data").join(format!("{city}.csv")), content).unwrap();
}

/// 24 hourly rows for one day with constant station and reference values.
fn day_rows(day: u32, a: &str, b: &str, us: &str) -> Vec<String> {
    (0..24)
        .map(|hour| format!("{hour},2013,1,{day},{hour},4,{a},{b},{us},-5"))
        .collect()
}

fn two_day_city() -> Vec<String> {
    let mut rows = day_rows(1, "10", "20", "40");
    rows.extend(day_rows(2, "200", "300", "100"));
    rows
}

#[tokio::test]
async fn test_daily_comparison_end_to_end() {
    let dir = workspace("daily");
    write_city(&dir, "x", &two_day_city());
    let config = Arc::new(config_for(&dir, &["x"]));

    let report = run_comparison(config).await.unwrap();

    assert_eq!(report.hourly_rows, 48);
    assert_eq!(report.daily.len(), 2);
    assert_eq!(report.daily[0].national, 15.0);
    assert_eq!(report.daily[1].national, 250.0);

    let tally = report.table.city("x").unwrap();
    assert_eq!(tally.national.get(SeverityClass::Good), 1);
    assert_eq!(tally.national.get(SeverityClass::Light), 0);
    assert_eq!(tally.national.get(SeverityClass::Medium), 0);
    assert_eq!(tally.national.get(SeverityClass::Heavy), 1);
    assert_eq!(tally.reference.get(SeverityClass::Light), 1);
    assert_eq!(tally.reference.get(SeverityClass::Medium), 1);

    let comparison = fs::read_to_string(dir.join("output2/comparison_result.csv")).unwrap();
    assert_eq!(
        comparison,
        "state,x_CH,x_US\ngood,1,0\nlight,0,1\nmedium,0,1\nheavy,1,0\n"
    );

    let day_stats = fs::read_to_string(dir.join("output2/day_stats.csv")).unwrap();
    let lines: Vec<_> = day_stats.lines().collect();
    assert_eq!(lines[1], "x,2013-1-1,15.0,40.0,good,light");
    assert_eq!(lines[2], "x,2013-1-2,250.0,100.0,heavy,medium");

    let all = fs::read_to_string(dir.join("output2/all_cities_pm.csv")).unwrap();
    assert_eq!(all.lines().count(), 49);
    assert_eq!(all.lines().next(), Some("date,city,PM_China,PM_US Post"));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_daily_comparison_drops_rows_missing_reference() {
    let dir = workspace("daily_missing");
    let mut rows = two_day_city();
    // all of day 2 loses its reference reading
    for row in rows.iter_mut().skip(24) {
        *row = row.replace(",100,", ",NA,");
    }
    write_city(&dir, "x", &rows);
    let config = Arc::new(config_for(&dir, &["x"]));

    let report = run_comparison(config).await.unwrap();

    assert_eq!(report.hourly_rows, 24);
    assert_eq!(report.daily.len(), 1);
    let tally = report.table.city("x").unwrap();
    assert_eq!(tally.national.get(SeverityClass::Heavy), 0);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_monthly_pipeline_scenario() {
    let dir = workspace("monthly");
    write_city(
        &dir,
        "x",
        &[
            "1,2013,3,1,0,1,10,20,NA,1".to_string(),
            "2,2013,3,1,1,1,30,40,NA,1".to_string(),
            "3,2013,3,1,2,1,50,60,NA,1".to_string(),
            "4,2013,3,1,3,1,NA,60,NA,1".to_string(),
        ],
    );
    let config = Arc::new(config_for(&dir, &["x"]));

    let report = run_monthly(config).await.unwrap();

    assert_eq!(report.cities.len(), 1);
    let stats = fs::read_to_string(dir.join("output/x_month_stats.csv")).unwrap();
    assert_eq!(stats, "month,A,B\n2013-03,30.0,40.0\n");

    // hourly city values are 15, 35 and 55
    let shares = report.cities[0].shares;
    assert_eq!(shares.good, 2.0 / 3.0);
    assert_eq!(shares.light, 1.0 / 3.0);
    assert!((shares.sum() - 1.0).abs() < 1e-9);

    let percentages = fs::read_to_string(dir.join("output/polluted_percentage.csv")).unwrap();
    assert_eq!(percentages.lines().next(), Some("city,heavy,medium,light,good"));
    assert!(percentages.lines().nth(1).unwrap().starts_with("x,0.0,0.0,"));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_cities_keep_configuration_order() {
    let dir = workspace("order");
    for city in ["zeta", "alpha", "mid"] {
        write_city(&dir, city, &two_day_city());
    }
    let mut config = config_for(&dir, &["zeta", "alpha", "mid"]);
    config.max_concurrent_cities = 2;
    let config = Arc::new(config);

    let monthly = run_monthly(config.clone()).await.unwrap();
    let names: Vec<_> = monthly.cities.iter().map(|c| c.city.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);

    let comparison = run_comparison(config).await.unwrap();
    assert_eq!(comparison.daily.len(), 6);
    // daily rows are keyed by city name, then date
    assert_eq!(comparison.daily[0].city, "alpha");
    assert_eq!(comparison.daily[5].city, "zeta");
    let columns: Vec<_> = comparison.table.cities.iter().map(|t| t.city.as_str()).collect();
    assert_eq!(columns, vec!["zeta", "alpha", "mid"]);
    let table = fs::read_to_string(dir.join("output2/comparison_result.csv")).unwrap();
    assert_eq!(
        table.lines().next(),
        Some("state,zeta_CH,zeta_US,alpha_CH,alpha_US,mid_CH,mid_US")
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_rerun_produces_identical_files() {
    let dir = workspace("rerun");
    write_city(&dir, "x", &two_day_city());
    let mut rows = day_rows(3, "33.3", "71.7", "NA");
    rows.extend(day_rows(4, "0.1", "0.2", "151"));
    write_city(&dir, "y", &rows);

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let config = Arc::new(config_for(&dir, &["x", "y"]));
        let monthly = run_monthly(config.clone()).await.unwrap();
        let comparison = run_comparison(config).await.unwrap();
        let files: Vec<Vec<u8>> = monthly
            .files
            .iter()
            .chain(&comparison.files)
            .map(|f| fs::read(f).unwrap())
            .collect();
        snapshots.push(files);
    }

    assert_eq!(snapshots[0].len(), 6);
    assert_eq!(snapshots[0], snapshots[1]);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_malformed_cell_aborts_run() {
    let dir = workspace("malformed");
    write_city(&dir, "good", &two_day_city());
    let mut rows = two_day_city();
    rows[5] = "5,2013,1,1,5,4,abc,20,40,-5".to_string();
    write_city(&dir, "bad", &rows);
    let config = Arc::new(config_for(&dir, &["good", "bad"]));

    let err = run_monthly(config).await.unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::MalformedInput { row, value, .. }) => {
            assert_eq!(*row, 6);
            assert_eq!(value, "abc");
        }
        other => panic!("expected MalformedInput, got {other:?}"),
    }
    assert!(!dir.join("output/polluted_percentage.csv").exists());
    assert!(!dir.join("output/good_month_stats.csv").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_empty_dataset_is_error() {
    let dir = workspace("empty");
    write_city(&dir, "x", &day_rows(1, "NA", "20", "40"));
    let config = Arc::new(config_for(&dir, &["x"]));

    let err = run_comparison(config).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::EmptyDataset { city }) if city == "x"
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_missing_city_file_is_io_error() {
    let dir = workspace("missing_file");
    let config = Arc::new(config_for(&dir, &["nowhere"]));

    let err = run_monthly(config).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Io { .. })
    ));

    fs::remove_dir_all(&dir).unwrap();
}
