use std::time::Instant;

use super::Dashboard;
use crate::error::{DashboardError, Result};
use crate::models::{AnalysisRequest, AnalysisResult, OperationKind};
use crate::services::{Backend, FormState};
use crate::session::SessionState;
use crate::view::Panel;

/// Builds the analyze request from the current selections, or the message to show instead.
pub fn assemble_request(
    session: &SessionState,
    form: &FormState,
) -> std::result::Result<AnalysisRequest, String> {
    let Some(metadata) = session.metadata() else {
        return Err("Upload a file first".to_string());
    };

    let (Some(operation), Some(column)) = (form.operation, form.column.as_deref()) else {
        return Err("Select all fields".to_string());
    };
    if column.is_empty() {
        return Err("Select all fields".to_string());
    }
    if !metadata.columns_for(operation).iter().any(|c| c == column) {
        return Err(format!("Column '{}' cannot be used for {}", column, operation));
    }

    let mut request = AnalysisRequest {
        operation,
        column: column.to_string(),
        chart_type: form.chart_type,
        n: None,
        group_col: None,
        agg: None,
    };

    match operation {
        OperationKind::Top => {
            let n = form
                .top_n
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "Top N must be a positive whole number".to_string())?;
            request.n = Some(n);
        }
        OperationKind::Group => {
            let group_col = form
                .group_col
                .as_deref()
                .filter(|g| metadata.columns.iter().any(|c| c == g))
                .ok_or_else(|| "Select a column to group by".to_string())?;
            request.group_col = Some(group_col.to_string());
            request.agg = Some(form.agg);
        }
        _ => {}
    }

    Ok(request)
}

impl<B: Backend> Dashboard<B> {
    /// Validates the form, sends one analyze request and routes the reply to
    /// the result panel, the KPIs and the chart.
    pub async fn run(&self) -> Result<AnalysisResult> {
        let assembled = {
            let session = self.session.lock();
            let form = self.form.lock();
            assemble_request(&session, &form.state)
        };
        let request = match assembled {
            Ok(request) => request,
            Err(message) => {
                self.show_result(Panel::error(message.clone()));
                return Err(DashboardError::Validation(message));
            }
        };

        let _flight = self.analysis_flight.begin()?;
        self.show_result(Panel::message("Processing..."));

        let start = Instant::now();
        tracing::info!("Running {} on column {}", request.operation, request.column);

        let response = match self.backend.analyze(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Analysis {} failed: {}", request.operation, err);
                self.show_result(Panel::error("Analysis failed"));
                return Err(err);
            }
        };

        let result = match response.into_outcome() {
            Ok(result) => result,
            Err(message) => {
                tracing::warn!("Server rejected {}: {}", request.operation, message);
                self.show_result(Panel::error(message.clone()));
                self.charts.lock().clear();
                return Err(DashboardError::Server(message));
            }
        };

        self.show_result(Panel::Markup(result.result_markup.clone()));
        if let Some(kpis) = &result.kpis {
            self.kpis.lock().show(kpis);
        }
        if let Some(chart) = &result.chart {
            self.charts.lock().render(request.chart_type, chart.clone());
        }

        tracing::info!("Analysis {} finished in {:?}", request.operation, start.elapsed());
        Ok(result)
    }
}
