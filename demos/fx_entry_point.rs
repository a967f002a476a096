// Example: fx_entry_point.rs
// Runs the G10 entry-point-vs-richness screen on simulated data and writes the
// richness scatter plus rolling beta/correlation charts as SVG files.
//
// Usage:
//     cargo run --example fx_entry_point -- [output_dir] [config.toml]
//
// Without a config file the G10 cross-asset preset is used over 2017-2020.

use std::env;
use std::error::Error;

use chrono::NaiveDate;
use fxrv_lib::{
    default_configs, render_report, PipelineConfig, RelativeValuePipeline, SvgChartSink,
    SyntheticProcess, SyntheticSource,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let output_dir = args.get(1).map(String::as_str).unwrap_or(".");

    let config = match args.get(2) {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => {
            let mut config = default_configs::g10_cross_asset("SPX");
            config.start_date = NaiveDate::from_ymd_opt(2017, 1, 2).ok_or("bad start date")?;
            config.end_date = NaiveDate::from_ymd_opt(2020, 9, 8);
            config
        }
    };

    // Spot follows a random walk, implied vol (decimals) mean-reverts around 8%
    let source = SyntheticSource::new(2020)
        .with_process(
            &config.spot.dataset,
            SyntheticProcess::GeometricBrownian {
                initial: 1.0,
                drift: 0.0,
                volatility: 0.08,
            },
        )
        .with_process(
            &config.implied_vol.source.dataset,
            SyntheticProcess::MeanReverting {
                mean: 0.08,
                speed: 4.0,
                volatility: 0.03,
            },
        )
        .with_process(
            "INDEX_SPOT",
            SyntheticProcess::GeometricBrownian {
                initial: 3000.0,
                drift: 0.05,
                volatility: 0.18,
            },
        );

    let pipeline = RelativeValuePipeline::new(&source, config)?;
    let report = pipeline.run()?;

    println!(
        "Run {} .. {}: {} aligned spot rows",
        report.start_date,
        report.end_date,
        report.spot.len()
    );
    println!("\nInstrument | Pct Rank | IV - RV | as of");
    for point in &report.richness {
        println!(
            "{:>10} | {:>8.1} | {:>+7.2} | {}",
            point.key, point.percentile_rank, point.spread, point.spread_date
        );
    }

    if let Some(cross) = &report.cross_asset {
        println!("\nLatest rolling beta / correlation vs benchmark:");
        for (key, stats) in cross.iter() {
            match (stats.beta.last(), stats.correlation.last()) {
                (Some((date, beta)), Some((_, corr))) => {
                    println!("{:>10} | beta {:+.3} | corr {:+.3} | {}", key, beta, corr, date)
                }
                _ => println!("{:>10} | insufficient history", key),
            }
        }
    }

    let mut sink = SvgChartSink::new(output_dir);
    render_report(&report, &mut sink)?;
    for path in sink.written() {
        println!("Chart saved to {}", path.display());
    }

    Ok(())
}
