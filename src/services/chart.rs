//! Ownership of the single rendered chart, and its PNG export (plotters bitmap).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{DashboardError, Result};
use crate::models::{ChartSpec, ChartType};

const PNG_SIZE: (u32, u32) = (800, 500);

/// Everything that determines how a chart looks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub chart_type: ChartType,
    /// Category axis.
    pub labels: Vec<String>,
    /// Name of the single data series.
    pub series_name: String,
    pub values: Vec<f64>,
    /// Visible title above the plot.
    pub title: String,
}

impl ChartConfig {
    pub fn from_spec(chart_type: ChartType, spec: ChartSpec) -> Self {
        Self {
            chart_type,
            labels: spec.labels,
            series_name: spec.title.clone(),
            values: spec.values,
            title: spec.title,
        }
    }
}

/// A live chart instance. Dropping it releases it.
#[derive(Debug)]
pub struct Chart {
    id: u64,
    config: ChartConfig,
    live: Arc<AtomicUsize>,
}

impl Chart {
    fn new(id: u64, config: ChartConfig, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { id, config, live }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        use plotters::prelude::*;

        let cfg = &self.config;
        if cfg.values.is_empty() {
            return Err(DashboardError::Export("No data to export".to_string()));
        }

        let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(export_error)?;

        let (y_min, y_max) = value_bounds(&cfg.values);
        let x_max = cfg.values.len() as f64 - 0.5;
        let labels = &cfg.labels;
        let label_at = |x: &f64| -> String {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(cfg.title.as_str(), ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..x_max, y_min..y_max)
            .map_err(export_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(cfg.values.len())
            .x_label_formatter(&label_at)
            .draw()
            .map_err(export_error)?;

        let points: Vec<(f64, f64)> = cfg
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
        let color = BLUE;

        match cfg.chart_type {
            ChartType::Bar => {
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, y)], color.filled())
                    }))
                    .map_err(export_error)?
                    .label(cfg.series_name.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }
            ChartType::Line => {
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color))
                    .map_err(export_error)?
                    .label(cfg.series_name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            ChartType::Scatter => {
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
                    .map_err(export_error)?
                    .label(cfg.series_name.as_str())
                    .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(export_error)?;

        root.present().map_err(export_error)?;
        Ok(())
    }
}

impl Drop for Chart {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Released chart #{}", self.id);
    }
}

fn export_error<E: std::fmt::Display>(err: E) -> DashboardError {
    DashboardError::Export(err.to_string())
}

/// Value axis range, always including zero so bars have a baseline.
fn value_bounds(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < f64::EPSILON {
        return (min, min + 1.0);
    }
    let pad = (max - min) * 0.05;
    (if min < 0.0 { min - pad } else { min }, max + pad)
}

/// Holds at most one live chart.
#[derive(Debug, Default)]
pub struct ChartManager {
    current: Option<Chart>,
    live: Arc<AtomicUsize>,
    next_id: u64,
}

impl ChartManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases the live chart (if any), then creates the replacement.
    pub fn render(&mut self, chart_type: ChartType, spec: ChartSpec) -> &Chart {
        self.clear();
        self.next_id += 1;
        let id = self.next_id;
        let config = ChartConfig::from_spec(chart_type, spec);
        tracing::debug!(
            "Rendering {} chart #{} '{}' with {} points",
            config.chart_type.as_str(),
            id,
            config.title,
            config.values.len()
        );
        self.current.insert(Chart::new(id, config, Arc::clone(&self.live)))
    }

    pub fn clear(&mut self) {
        drop(self.current.take());
    }

    pub fn current(&self) -> Option<&Chart> {
        self.current.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    /// Chart instances created by this manager and not yet released.
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn export_png(&self, path: &Path) -> Result<()> {
        let chart = self
            .current
            .as_ref()
            .ok_or_else(|| DashboardError::Export("No chart to export".to_string()))?;
        chart.write_png(path)?;
        tracing::info!("Chart #{} exported to {}", chart.id, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(title: &str, labels: &[&str], values: &[f64]) -> ChartSpec {
        ChartSpec {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            title: title.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn render_configures_a_single_titled_series() {
        let mut charts = ChartManager::new();
        let chart = charts.render(ChartType::Bar, spec("Sum of B", &["x"], &[42.0]));
        let config = chart.config();
        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.labels, vec!["x"]);
        assert_eq!(config.series_name, "Sum of B");
        assert_eq!(config.title, "Sum of B");
        assert_eq!(config.values, vec![42.0]);
    }

    #[test]
    fn second_render_replaces_the_first() {
        let mut charts = ChartManager::new();
        let first = charts.render(ChartType::Bar, spec("first", &["a"], &[1.0])).id();
        let second = charts
            .render(ChartType::Line, spec("second", &["b", "c"], &[2.0, 3.0]))
            .id();

        assert_ne!(first, second);
        assert_eq!(charts.live_instances(), 1);
        let config = charts.current().unwrap().config();
        assert_eq!(config.chart_type, ChartType::Line);
        assert_eq!(config.title, "second");
        assert_eq!(config.labels, vec!["b", "c"]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut charts = ChartManager::new();
        charts.clear();
        assert!(!charts.is_live());

        charts.render(ChartType::Scatter, spec("t", &["a"], &[1.0]));
        charts.clear();
        charts.clear();
        assert!(!charts.is_live());
        assert_eq!(charts.live_instances(), 0);
    }

    #[test]
    fn export_requires_a_live_chart_with_data() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.png");

        let mut charts = ChartManager::new();
        assert!(matches!(charts.export_png(&path), Err(DashboardError::Export(_))));

        charts.render(ChartType::Bar, spec("empty", &[], &[]));
        assert!(matches!(charts.export_png(&path), Err(DashboardError::Export(_))));
        assert!(!path.exists());
    }

    #[test]
    fn value_bounds_include_zero() {
        assert_eq!(value_bounds(&[5.0, 5.0]).0, 0.0);
        let (lo, hi) = value_bounds(&[-10.0, 10.0]);
        assert!(lo < -10.0 && hi > 10.0);
        assert_eq!(value_bounds(&[0.0]), (0.0, 1.0));
    }
}
