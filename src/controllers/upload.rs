use std::time::Instant;

use super::Dashboard;
use crate::error::{DashboardError, Result};
use crate::models::DatasetMetadata;
use crate::services::Backend;
use crate::view::Panel;

impl<B: Backend> Dashboard<B> {
    /// Sends the selected file and, on success, installs its metadata and
    /// resets the form, the KPIs and the chart.
    pub async fn upload(&self) -> Result<DatasetMetadata> {
        let Some(file) = self.selected_file.lock().clone() else {
            self.panels.lock().file_label = Panel::error("Select a file first");
            return Err(DashboardError::Validation("Select a file first".to_string()));
        };

        if file.len() > self.config.max_file_size {
            let message = format!(
                "File is too large ({}KB, limit {}KB)",
                file.len() / 1024,
                self.config.max_file_size / 1024
            );
            self.panels.lock().file_label = Panel::error(message.clone());
            return Err(DashboardError::Validation(message));
        }

        let _flight = self.upload_flight.begin()?;
        {
            let mut panels = self.panels.lock();
            panels.preview = Panel::message("Uploading & loading preview...");
            panels.result = Panel::message("Waiting for analysis...");
        }

        let start = Instant::now();
        tracing::info!("Uploading {} ({}KB)", file.name, file.len() / 1024);

        let response = match self.backend.upload(&file).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Upload of {} failed: {}", file.name, err);
                self.panels.lock().preview = Panel::error("Server error");
                return Err(err);
            }
        };

        let dataset = match response.into_outcome() {
            Ok(dataset) => dataset,
            Err(message) => {
                tracing::warn!("Server rejected {}: {}", file.name, message);
                self.panels.lock().preview = Panel::error(message.clone());
                return Err(DashboardError::Server(message));
            }
        };

        self.session.lock().install(dataset.metadata.clone());
        {
            let mut panels = self.panels.lock();
            panels.preview = Panel::Markup(dataset.preview);
            panels.file_label = Panel::message("Upload successful");
        }
        self.form.lock().clear();
        self.kpis.lock().reset();
        self.charts.lock().clear();

        tracing::info!(
            "Loaded {} with {} columns ({} numeric) in {:?}",
            file.name,
            dataset.metadata.columns.len(),
            dataset.metadata.numeric_columns.len(),
            start.elapsed()
        );
        Ok(dataset.metadata)
    }
}
