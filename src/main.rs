use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use sheet_dashboard::{
    config, logging, Aggregation, ChartType, Dashboard, HttpBackend, KpiKey, OperationKind,
    UploadFile,
};

/// Upload a dataset to the analysis server and run one analysis on it.
#[derive(Debug, Parser)]
#[command(name = "sheet-dashboard", version)]
struct Cli {
    /// CSV or Excel file to upload
    file: PathBuf,

    /// top, sum, average, group, count or unique
    #[arg(short, long)]
    operation: OperationKind,

    /// Value column (defaults to the first eligible column)
    #[arg(short, long)]
    column: Option<String>,

    #[arg(long, default_value = "bar")]
    chart_type: ChartType,

    /// Row count for `top`
    #[arg(short = 'n', long)]
    top_n: Option<String>,

    /// Group-by column for `group`
    #[arg(long)]
    group_col: Option<String>,

    /// sum or mean, for `group`
    #[arg(long, default_value = "sum")]
    agg: Aggregation,

    /// Overrides DASHBOARD_BACKEND_URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Save the rendered chart as PNG
    #[arg(long)]
    chart_png: Option<PathBuf>,

    /// Save the analysis result spreadsheet
    #[arg(long)]
    download_excel: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    let cli = Cli::parse();

    // Load configuration
    let mut config = config::load_config()?;
    if let Some(url) = cli.backend_url.clone() {
        config = config.with_backend_url(url);
    }
    tracing::info!("Using analysis server at {}", config.backend_url);

    let backend = HttpBackend::new(&config)?;
    let dashboard = Dashboard::new(backend, config);

    let file = UploadFile::from_path(&cli.file)
        .await
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    dashboard.select_file(file);
    dashboard.upload().await?;
    println!("{}", dashboard.view().preview.text());

    dashboard.set_chart_type(cli.chart_type);
    dashboard.on_operation_changed(cli.operation);
    if let Some(column) = &cli.column {
        dashboard.select_column(column)?;
    }
    if let Some(n) = &cli.top_n {
        dashboard.set_top_n(n.clone());
    }
    if let Some(group_col) = &cli.group_col {
        dashboard.select_group_column(group_col)?;
    }
    dashboard.set_aggregation(cli.agg);

    dashboard.run().await?;
    dashboard.settle().await;

    let view = dashboard.view();
    println!("{}", view.result.text());
    for key in KpiKey::ALL {
        println!("{:>5}: {}", key.as_str(), view.kpis.text(key));
    }
    if let Some(chart) = &view.chart {
        println!("chart: {} ({}, {} points)", chart.title, chart.chart_type.as_str(), chart.values.len());
    }

    if let Some(path) = &cli.chart_png {
        dashboard.export_chart_png(path)?;
        println!("Chart saved to {}", path.display());
    }
    if let Some(path) = &cli.download_excel {
        let size = dashboard.backend().download_excel(path).await?;
        println!("Spreadsheet saved to {} ({} bytes)", path.display(), size);
    }

    Ok(())
}
