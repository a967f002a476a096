use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use log::{debug, info};
use plotters::prelude::*;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use super::{ChartSink, LineChart, ScatterChart};

/// Writes each chart to `<output_dir>/<slugified title>.svg` with plotters.
#[derive(Debug, Clone)]
pub struct SvgChartSink {
    output_dir: PathBuf,
    size: (u32, u32),
    written: Vec<PathBuf>,
}

impl SvgChartSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            size: (1280, 768),
            written: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Files written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, title: &str) -> PathBuf {
        let slug: String = title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        self.output_dir.join(format!("{}.svg", slug))
    }
}

fn render_error(path: &Path, err: impl Display) -> anyhow::Error {
    anyhow!("failed to render {}: {}", path.display(), err)
}

/// Min/max of `values` widened by 5% on each side; a flat range is widened by 1.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    if hi - lo < f64::EPSILON {
        return Some((lo - 1.0, hi + 1.0));
    }
    let pad = (hi - lo) * 0.05;
    Some((lo - pad, hi + pad))
}

impl ChartSink for SvgChartSink {
    fn render_scatter(&mut self, chart: &ScatterChart) -> Result<()> {
        let (Some((x_min, x_max)), Some((y_min, y_max))) = (
            padded_range(chart.points.iter().map(|p| p.x)),
            padded_range(chart.points.iter().map(|p| p.y)),
        ) else {
            debug!("'{}': no points, nothing rendered", chart.title);
            return Ok(());
        };

        let path = self.path_for(&chart.title);
        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(|e| render_error(&path, e))?;

            let mut plot = ChartBuilder::on(&root)
                .margin(20)
                .caption(&chart.title, ("sans-serif", 30))
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)
                .map_err(|e| render_error(&path, e))?;

            plot.configure_mesh()
                .x_desc(chart.x_label.as_str())
                .y_desc(chart.y_label.as_str())
                .draw()
                .map_err(|e| render_error(&path, e))?;

            for (i, point) in chart.points.iter().enumerate() {
                let color = Palette99::pick(i).to_rgba();
                plot.draw_series(std::iter::once(Circle::new(
                    (point.x, point.y),
                    5,
                    color.filled(),
                )))
                .map_err(|e| render_error(&path, e))?
                .label(point.label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            }

            plot.configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| render_error(&path, e))?;

            root.present().map_err(|e| render_error(&path, e))?;
        }

        info!("chart saved to {}", path.display());
        self.written.push(path);
        Ok(())
    }

    fn render_lines(&mut self, chart: &LineChart) -> Result<()> {
        let all_points = || chart.series.iter().flat_map(|(_, s)| s.iter());
        let (Some(first), Some(last)) = (
            all_points().map(|(d, _)| *d).min(),
            all_points().map(|(d, _)| *d).max(),
        ) else {
            debug!("'{}': no points, nothing rendered", chart.title);
            return Ok(());
        };
        let Some((y_min, y_max)) = padded_range(all_points().map(|(_, v)| *v)) else {
            debug!("'{}': no finite values, nothing rendered", chart.title);
            return Ok(());
        };

        let offset = |d: NaiveDate| (d - first).num_days() as f64;
        let x_max = offset(last).max(1.0);
        let date_label = |x: &f64| {
            (first + Duration::days(x.round() as i64))
                .format("%Y-%m-%d")
                .to_string()
        };

        let path = self.path_for(&chart.title);
        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(|e| render_error(&path, e))?;

            let mut plot = ChartBuilder::on(&root)
                .margin(20)
                .caption(&chart.title, ("sans-serif", 30))
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(0.0..x_max, y_min..y_max)
                .map_err(|e| render_error(&path, e))?;

            plot.configure_mesh()
                .x_labels(8)
                .x_label_formatter(&date_label)
                .y_desc(chart.y_label.as_str())
                .draw()
                .map_err(|e| render_error(&path, e))?;

            for (i, (key, series)) in chart.series.iter().enumerate() {
                if series.is_empty() {
                    continue;
                }
                let color = Palette99::pick(i).to_rgba();
                plot.draw_series(LineSeries::new(
                    series.iter().map(|(d, v)| (offset(*d), *v)),
                    color.stroke_width(2),
                ))
                .map_err(|e| render_error(&path, e))?
                .label(key.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }

            plot.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| render_error(&path, e))?;

            root.present().map_err(|e| render_error(&path, e))?;
        }

        info!("chart saved to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
