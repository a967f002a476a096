//! Presentation adapter
//!
//! The pipeline hands its report to a [`ChartSink`]; what the sink does with it
//! (SVG files, a notebook, nothing) is not the pipeline's concern.

pub mod svg;

pub use svg::SvgChartSink;

use anyhow::Result;

use crate::pipeline::RelativeValueReport;
use crate::series::{InstrumentKey, TimeSeries};

/// A labelled point of a scatter chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub label: InstrumentKey,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
}

/// Dated lines sharing one y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub y_label: String,
    pub series: Vec<(InstrumentKey, TimeSeries)>,
}

/// Destination for charts.
pub trait ChartSink {
    fn render_scatter(&mut self, chart: &ScatterChart) -> Result<()>;

    fn render_lines(&mut self, chart: &LineChart) -> Result<()>;
}

/// Build the "Entry Point vs Richness" scatter from a report.
pub fn richness_chart(report: &RelativeValueReport) -> ScatterChart {
    ScatterChart {
        title: "Entry Point vs Richness".to_string(),
        x_label: "Percentile of Current Implied Vol".to_string(),
        y_label: "Implied vs Realized Vol".to_string(),
        points: report
            .richness
            .iter()
            .map(|p| ScatterPoint {
                label: p.key.clone(),
                x: p.percentile_rank,
                y: p.spread,
            })
            .collect(),
    }
}

/// Send every chart a report supports to `sink`: the richness scatter, and rolling
/// beta / correlation lines when the report has a cross-asset section.
pub fn render_report(report: &RelativeValueReport, sink: &mut dyn ChartSink) -> Result<()> {
    sink.render_scatter(&richness_chart(report))?;

    if let Some(cross) = &report.cross_asset {
        let beta = LineChart {
            title: "Rolling Beta vs Benchmark".to_string(),
            y_label: "Beta".to_string(),
            series: cross
                .iter()
                .map(|(key, stats)| (key.clone(), stats.beta.clone()))
                .collect(),
        };
        sink.render_lines(&beta)?;

        let correlation = LineChart {
            title: "Rolling Correlation vs Benchmark".to_string(),
            y_label: "Correlation".to_string(),
            series: cross
                .iter()
                .map(|(key, stats)| (key.clone(), stats.correlation.clone()))
                .collect(),
        };
        sink.render_lines(&correlation)?;
    }

    Ok(())
}
