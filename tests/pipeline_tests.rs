
use anyhow::Result;
use approx::assert_relative_eq;
use chrono::NaiveDate;
use fxrv_lib::{
    realized_volatility, render_report, run_relative_value, BenchmarkConfig, ChartSink,
    CsvSource, DataSource, DatasetConfig, InMemorySource, InstrumentKey, LineChart,
    PipelineConfig, RealizedVolConfig, RelativeValuePipeline, ReturnType, ScatterChart,
    SeriesRequest, SourceError, SvgChartSink, SyntheticProcess, SyntheticSource,
};
use std::collections::BTreeMap;
use test_utils::{business_dates, observations, on_business_days, random_walk, write_csv};

const SPOT: &str = "FXSPOT_PREMIUM";
const IMPLIED: &str = "FXIMPLIEDVOL_PREMIUM";
const INDEX: &str = "INDEX_SPOT";
const DAYS: usize = 100;

/// Three instruments on 100 business days.
///
/// Implied vol (decimals) is rising for EURUSD, falling for USDJPY and flat for AUDUSD,
/// so the latest percentile ranks are 100, 1 and 100.
fn fixture_source() -> InMemorySource {
    let mut source = InMemorySource::new();

    let implied_paths: [(&str, Vec<f64>); 3] = [
        ("EURUSD", (0..DAYS).map(|i| 0.05 + 0.0002 * i as f64).collect()),
        ("USDJPY", (0..DAYS).map(|i| 0.12 - 0.0003 * i as f64).collect()),
        ("AUDUSD", vec![0.10; DAYS]),
    ];
    for (seed, (key, implied)) in implied_paths.iter().enumerate() {
        let spot = on_business_days(&random_walk(seed as u64 + 1, DAYS, 1.0 + seed as f64, 0.01));
        source.insert(SPOT, key, observations(&spot));
        source.insert(IMPLIED, key, observations(&on_business_days(implied)));
    }

    // Benchmark closed on every seventh business day
    let bench = on_business_days(&random_walk(99, DAYS, 3000.0, 0.015));
    let rows = observations(&bench)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % 7 != 4)
        .map(|(_, row)| row)
        .collect();
    source.insert(INDEX, "SPX", rows);

    source
}

fn fixture_config() -> PipelineConfig {
    let dates = business_dates(DAYS);
    PipelineConfig {
        instruments: ["EURUSD", "USDJPY", "AUDUSD"]
            .into_iter()
            .map(InstrumentKey::from)
            .collect(),
        start_date: dates[0],
        end_date: Some(dates[DAYS - 1]),
        percentile_slice_start: dates[0],
        percentile_slice_end: dates[DAYS - 1],
        ..PipelineConfig::default()
    }
}

fn with_benchmark(config: PipelineConfig) -> PipelineConfig {
    PipelineConfig {
        benchmark: Some(BenchmarkConfig {
            instrument: InstrumentKey::from("SPX"),
            source: DatasetConfig {
                dataset: INDEX.to_string(),
                field: "spot".to_string(),
                filters: BTreeMap::new(),
            },
        }),
        ..config
    }
}

// ------------------------------------------------------------------------------------------------
// End to end
// ------------------------------------------------------------------------------------------------

#[test]
fn test_pipeline_end_to_end() -> Result<()> {
    let source = fixture_source();
    let dates = business_dates(DAYS);

    let report = RelativeValuePipeline::new(&source, fixture_config())?.run()?;

    assert_eq!(report.start_date, dates[0]);
    assert_eq!(report.end_date, dates[DAYS - 1]);
    assert_eq!(report.spot.len(), DAYS);
    assert_eq!(report.spot.width(), 3);

    // 63-observation window: first 62 dates have no realized vol
    assert_eq!(report.realized_vol.len(), DAYS - 62);
    assert_eq!(report.realized_vol.dates(), &dates[62..]);

    // Each instrument's own realized-vol series covers the same trailing dates
    for key in ["EURUSD", "USDJPY", "AUDUSD"] {
        let request = SeriesRequest::new(
            SPOT,
            InstrumentKey::from(key),
            "spot",
            dates[0],
            dates[DAYS - 1],
        );
        let vol = realized_volatility(&source.fetch(&request)?, &RealizedVolConfig::default());
        assert_eq!(vol.len(), DAYS - 62, "{} realized vol points", key);
        assert_eq!(vol.dates(), dates[62..].to_vec());
        assert_eq!(Some(vol), report.realized_vol.column(key));
    }

    // Implied vol is in vol points
    let audusd_implied = report.implied_vol.value(dates[0], "AUDUSD").unwrap();
    assert_relative_eq!(audusd_implied, 10.0, epsilon = 1e-9);

    // Spread lives on the realized-vol dates and is implied minus realized
    assert_eq!(report.spread.dates(), report.realized_vol.dates());
    for date in report.spread.dates() {
        for key in ["EURUSD", "USDJPY", "AUDUSD"] {
            let expected = report.implied_vol.value(*date, key).unwrap()
                - report.realized_vol.value(*date, key).unwrap();
            let spread = report.spread.value(*date, key).unwrap();
            assert_relative_eq!(spread, expected, epsilon = 1e-12);
        }
    }

    // Latest percentile ranks over the whole slice
    assert_relative_eq!(report.percentile_rank("EURUSD").unwrap(), 100.0);
    assert_relative_eq!(report.percentile_rank("USDJPY").unwrap(), 1.0);
    assert_relative_eq!(report.percentile_rank("AUDUSD").unwrap(), 100.0);

    // Richness pairs each rank with the spread on the slice end
    assert_eq!(report.richness.len(), 3);
    let usdjpy = report.richness_point("USDJPY").unwrap();
    assert_eq!(usdjpy.spread_date, dates[DAYS - 1]);
    assert_relative_eq!(usdjpy.percentile_rank, 1.0);
    assert_relative_eq!(
        usdjpy.spread,
        report.spread.value(dates[DAYS - 1], "USDJPY").unwrap()
    );

    assert!(report.cross_asset.is_none());
    Ok(())
}

/// With a benchmark the report carries beta/correlation for every instrument.
#[test]
fn test_pipeline_cross_asset_stage() -> Result<()> {
    let source = fixture_source();
    let dates = business_dates(DAYS);
    let config = with_benchmark(fixture_config());

    let report = RelativeValuePipeline::new(&source, config)?.run()?;
    let cross = report.cross_asset.as_ref().unwrap();

    assert_eq!(cross.len(), 3);
    for (_, stats) in cross.iter() {
        assert_eq!(stats.beta.len(), DAYS - 84 + 1);
        assert_eq!(stats.beta.first().unwrap().0, dates[83]);
        assert!(stats
            .correlation
            .values()
            .iter()
            .all(|c| (-1.0..=1.0).contains(c)));
    }
    Ok(())
}

/// Running twice on the same source gives the same report.
#[test]
fn test_pipeline_is_repeatable() -> Result<()> {
    let source = fixture_source();
    let pipeline = RelativeValuePipeline::new(&source, with_benchmark(fixture_config()))?;

    let first = pipeline.run()?;
    let second = pipeline.run()?;
    assert_eq!(first, second);

    let third = run_relative_value(&source, with_benchmark(fixture_config()))?;
    assert_eq!(first, third);
    Ok(())
}

/// Without an explicit end date the run stops on the business day before `today`.
#[test]
fn test_pipeline_defaults_end_to_previous_business_day() -> Result<()> {
    let source = fixture_source();
    let dates = business_dates(DAYS + 1);
    let config = PipelineConfig {
        end_date: None,
        ..fixture_config()
    };

    let report = RelativeValuePipeline::new(&source, config)?.run_as_of(dates[DAYS])?;

    assert_eq!(report.end_date, dates[DAYS - 1]);
    assert_eq!(report.spot.dates().last(), Some(&dates[DAYS - 1]));
    Ok(())
}

/// A failed fetch aborts the run and the source error survives the context chain.
#[test]
fn test_pipeline_propagates_source_errors() {
    let source = fixture_source();
    let mut config = fixture_config();
    config.instruments.push(InstrumentKey::from("USDCAD"));

    let err = RelativeValuePipeline::new(&source, config)
        .unwrap()
        .run()
        .unwrap_err();

    match err.downcast_ref::<SourceError>() {
        Some(SourceError::NotFound {
            dataset,
            instrument,
        }) => {
            assert_eq!(dataset, SPOT);
            assert_eq!(instrument, "USDCAD");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(format!("{:#}", err).contains("USDCAD"));
}

/// A missing benchmark is an error too, not a silently skipped stage.
#[test]
fn test_pipeline_missing_benchmark_is_an_error() {
    let source = fixture_source();
    let mut config = with_benchmark(fixture_config());
    if let Some(bench) = config.benchmark.as_mut() {
        bench.instrument = InstrumentKey::from("NKY");
    }

    let err = run_relative_value(&source, config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SourceError>(),
        Some(SourceError::NotFound { .. })
    ));
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

#[test]
fn test_default_config_matches_g10_preset() {
    let config = PipelineConfig::g10();

    assert_eq!(config.instruments.len(), 10);
    assert_eq!(config.instruments[0].as_str(), "USDJPY");
    assert_eq!(config.instruments[9].as_str(), "AUDJPY");
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2005, 8, 26).unwrap());
    assert_eq!(config.end_date, None);
    assert_eq!(config.realized_vol_window, 63);
    assert_eq!(config.beta_window, 84);
    assert_eq!(config.spot.dataset, SPOT);
    assert_eq!(config.implied_vol.source.dataset, IMPLIED);
    assert_eq!(config.implied_vol.source.filters["tenor"], "3m");
    assert_eq!(config.implied_vol.source.filters["deltaStrike"], "DN");
    assert_eq!(config.implied_vol.source.filters["location"], "NYC");
    assert_eq!(
        config.richness_date(),
        NaiveDate::from_ymd_opt(2020, 9, 8).unwrap()
    );
    assert!(config.validate().is_ok());

    // 2024-03-04 is a Monday
    let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    assert_eq!(
        config.resolve_end_date(monday),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    );
}

#[test]
fn test_config_from_toml() -> Result<()> {
    let text = r#"
        instruments = ["EURUSD", "USDJPY"]
        start_date = "2019-01-02"
        end_date = "2020-09-08"
        realized_vol_window = 21
        beta_returns = "log"

        [implied_vol]
        dataset = "FXIMPLIEDVOL_PREMIUM"
        field = "impliedVolatility"
        scale = 100.0
        filters = { tenor = "1m", deltaStrike = "DN", location = "NYC" }

        [benchmark]
        instrument = "SPX"
        dataset = "INDEX_SPOT"
        field = "spot"
    "#;

    let config = PipelineConfig::from_toml_str(text)?;

    assert_eq!(config.instruments.len(), 2);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2019, 1, 2).unwrap());
    assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2020, 9, 8));
    assert_eq!(config.realized_vol_window, 21);
    assert_eq!(config.beta_returns, ReturnType::Log);
    assert_eq!(config.implied_vol.source.filters["tenor"], "1m");
    // Omitted settings fall back to the defaults
    assert_eq!(config.beta_window, 84);
    assert_eq!(config.spot.dataset, SPOT);
    let bench = config.benchmark.as_ref().unwrap();
    assert_eq!(bench.instrument.as_str(), "SPX");
    assert_eq!(bench.source.dataset, INDEX);
    Ok(())
}

#[test]
fn test_config_from_toml_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("pipeline.toml");
    std::fs::write(&path, "instruments = [\"GBPUSD\"]\nbeta_window = 42\n")?;

    let config = PipelineConfig::from_toml_file(&path)?;
    assert_eq!(config.instruments, vec![InstrumentKey::from("GBPUSD")]);
    assert_eq!(config.beta_window, 42);

    assert!(PipelineConfig::from_toml_file(dir.path().join("missing.toml")).is_err());
    Ok(())
}

#[test]
fn test_config_validation() {
    assert!(PipelineConfig::from_toml_str("realized_vol_window = 2").is_err());
    assert!(PipelineConfig::from_toml_str("instruments = []").is_err());
    assert!(PipelineConfig::from_toml_str(
        "percentile_slice_start = \"2020-09-08\"\npercentile_slice_end = \"2018-09-01\""
    )
    .is_err());
    assert!(
        PipelineConfig::from_toml_str("start_date = \"2020-01-01\"\nend_date = \"2019-01-01\"")
            .is_err()
    );

    let source = fixture_source();
    let config = PipelineConfig {
        beta_window: 1,
        ..fixture_config()
    };
    assert!(RelativeValuePipeline::new(&source, config).is_err());

    let config = PipelineConfig {
        annualization_factor: 0.0,
        ..fixture_config()
    };
    assert!(config.validate().is_err());
}

// ------------------------------------------------------------------------------------------------
// Sources
// ------------------------------------------------------------------------------------------------

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn implied_request(instrument: &str) -> SeriesRequest {
    let filters = [("tenor", "3m"), ("deltaStrike", "DN"), ("location", "NYC"), ("currency", "USD")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SeriesRequest::new(
        IMPLIED,
        InstrumentKey::from(instrument),
        "impliedVolatility",
        ymd(2020, 1, 1),
        ymd(2020, 1, 31),
    )
    .with_filters(filters)
}

/// Filters select rows, a repeated date keeps the last row, blanks are missing values,
/// and filters naming absent columns are ignored.
#[test]
fn test_csv_source_reads_filtered_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_csv(
        dir.path(),
        IMPLIED,
        "EURUSD",
        "date,tenor,deltaStrike,location,impliedVolatility",
        &[
            "2020-01-03,3m,DN,NYC,0.071",
            "2020-01-02,3m,DN,NYC,0.070",
            "2020-01-02,1m,DN,NYC,0.090",
            "2020-01-03,3m,DN,NYC,0.072",
            "2020-01-06,3m,DN,NYC,",
            "2020-01-07,3m,DN,LDN,0.080",
            "2020-01-07,3m,DN,NYC,0.075",
            "2019-12-31,3m,DN,NYC,0.060",
        ],
    );

    let source = CsvSource::new(dir.path());
    let series = source.fetch(&implied_request("EURUSD"))?;

    assert_eq!(
        series.points(),
        &[
            (ymd(2020, 1, 2), 0.070),
            (ymd(2020, 1, 3), 0.072),
            (ymd(2020, 1, 7), 0.075),
        ]
    );
    Ok(())
}

/// Non-finite rows from a source are missing observations, not values.
#[test]
fn test_fetch_drops_non_finite_rows() -> Result<()> {
    let source = InMemorySource::new().with_series(
        SPOT,
        "EURUSD",
        vec![
            (ymd(2020, 1, 2), 1.12),
            (ymd(2020, 1, 3), f64::NAN),
            (ymd(2020, 1, 6), f64::INFINITY),
            (ymd(2020, 1, 7), 1.13),
        ],
    );
    let request = SeriesRequest::new(
        SPOT,
        InstrumentKey::from("EURUSD"),
        "spot",
        ymd(2020, 1, 1),
        ymd(2020, 1, 31),
    );

    let series = source.fetch(&request)?;

    assert_eq!(series.points(), &[(ymd(2020, 1, 2), 1.12), (ymd(2020, 1, 7), 1.13)]);
    Ok(())
}

#[test]
fn test_csv_source_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = CsvSource::new(dir.path());

    assert!(matches!(
        source.get_series(&implied_request("USDJPY")),
        Err(SourceError::NotFound { .. })
    ));

    // The dataset path is a plain file, so opening the instrument file fails with an
    // I/O error other than "not found"
    std::fs::write(dir.path().join(SPOT), "not a directory")?;
    let spot_request = SeriesRequest::new(
        SPOT,
        InstrumentKey::from("EURUSD"),
        "spot",
        ymd(2020, 1, 1),
        ymd(2020, 1, 31),
    );
    assert!(matches!(
        source.get_series(&spot_request),
        Err(SourceError::Io(_))
    ));

    write_csv(dir.path(), IMPLIED, "USDJPY", "date,impliedVolatility", &["2020-01-02,abc"]);
    assert!(matches!(
        source.get_series(&implied_request("USDJPY")),
        Err(SourceError::InvalidData(_))
    ));

    write_csv(dir.path(), IMPLIED, "AUDUSD", "date,spot", &["2020-01-02,0.7"]);
    assert!(matches!(
        source.get_series(&implied_request("AUDUSD")),
        Err(SourceError::InvalidData(_))
    ));
    Ok(())
}

#[test]
fn test_csv_source_custom_date_format() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_csv(
        dir.path(),
        SPOT,
        "EURUSD",
        "asOfDate,spot",
        &["02/01/2020,1.12", "03/01/2020,1.11"],
    );

    let source = CsvSource::new(dir.path())
        .with_date_column("asOfDate")
        .with_date_format("%d/%m/%Y");
    let request = SeriesRequest::new(
        SPOT,
        InstrumentKey::from("EURUSD"),
        "spot",
        ymd(2020, 1, 1),
        ymd(2020, 12, 31),
    );

    let series = source.fetch(&request)?;
    assert_eq!(series.values(), vec![1.12, 1.11]);
    assert_eq!(series.first().map(|(d, _)| d), Some(ymd(2020, 1, 2)));
    Ok(())
}

#[test]
fn test_synthetic_source_is_deterministic() -> Result<()> {
    let source = SyntheticSource::new(7).with_process(
        IMPLIED,
        SyntheticProcess::MeanReverting {
            mean: 0.08,
            speed: 4.0,
            volatility: 0.03,
        },
    );
    let request = |dataset: &str, instrument: &str| {
        SeriesRequest::new(
            dataset,
            InstrumentKey::from(instrument),
            "value",
            ymd(2020, 1, 1),
            ymd(2020, 3, 31),
        )
    };

    let a = source.fetch(&request(SPOT, "EURUSD"))?;
    let b = source.fetch(&request(SPOT, "EURUSD"))?;
    let c = source.fetch(&request(SPOT, "USDJPY"))?;
    let vol = source.fetch(&request(IMPLIED, "EURUSD"))?;

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(!a.is_empty());
    assert!(a.values().iter().all(|v| *v > 0.0));
    assert!(vol.values().iter().all(|v| *v > 0.0 && *v < 1.0));
    assert!(a
        .dates()
        .iter()
        .all(|d| fxrv_lib::calendar::is_business_day(*d)));

    let other_seed = SyntheticSource::new(8).fetch(&request(SPOT, "EURUSD"))?;
    assert_ne!(a, other_seed);
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Presentation
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSink {
    scatters: Vec<ScatterChart>,
    lines: Vec<LineChart>,
}

impl ChartSink for RecordingSink {
    fn render_scatter(&mut self, chart: &ScatterChart) -> Result<()> {
        self.scatters.push(chart.clone());
        Ok(())
    }

    fn render_lines(&mut self, chart: &LineChart) -> Result<()> {
        self.lines.push(chart.clone());
        Ok(())
    }
}

#[test]
fn test_render_report_feeds_sink() -> Result<()> {
    let source = fixture_source();
    let report = run_relative_value(&source, with_benchmark(fixture_config()))?;

    let mut sink = RecordingSink::default();
    render_report(&report, &mut sink)?;

    assert_eq!(sink.scatters.len(), 1);
    let scatter = &sink.scatters[0];
    assert_eq!(scatter.title, "Entry Point vs Richness");
    assert_eq!(scatter.points.len(), 3);
    for point in &scatter.points {
        let richness = report.richness_point(point.label.as_str()).unwrap();
        assert_eq!(point.x, richness.percentile_rank);
        assert_eq!(point.y, richness.spread);
    }

    assert_eq!(sink.lines.len(), 2);
    let cross = report.cross_asset.as_ref().unwrap();
    let (key, beta) = &sink.lines[0].series[0];
    assert_eq!(beta, &cross.get(key.as_str()).unwrap().beta);
    Ok(())
}

#[test]
fn test_svg_sink_writes_charts() -> Result<()> {
    let source = fixture_source();
    let dir = tempfile::tempdir()?;

    let without_benchmark = run_relative_value(&source, fixture_config())?;
    let mut sink = SvgChartSink::new(dir.path()).with_size(640, 480);
    render_report(&without_benchmark, &mut sink)?;
    assert_eq!(sink.written().len(), 1);

    let with_bench = run_relative_value(&source, with_benchmark(fixture_config()))?;
    let mut sink = SvgChartSink::new(dir.path());
    render_report(&with_bench, &mut sink)?;
    assert_eq!(sink.written().len(), 3);

    for path in sink.written() {
        let svg = std::fs::read_to_string(path)?;
        assert!(svg.contains("<svg"), "{} is not an SVG", path.display());
    }
    assert!(dir.path().join("entry_point_vs_richness.svg").exists());
    Ok(())
}
