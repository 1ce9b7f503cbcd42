use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{Aggregation, ChartType, OperationKind};
use crate::services::{ChartManager, FormState, KpiAnimator, OperationForm, UploadFile};
use crate::session::SessionState;
use crate::view::{DashboardView, Panel, Panels};

pub mod analysis;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

/// Rejects a second trigger of the same action while one is outstanding.
#[derive(Debug)]
struct InFlight {
    busy: AtomicBool,
    action: &'static str,
}

impl InFlight {
    const fn new(action: &'static str) -> Self {
        Self {
            busy: AtomicBool::new(false),
            action,
        }
    }

    fn begin(&self) -> Result<FlightGuard<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            tracing::warn!("Rejected {}: previous request still in flight", self.action);
            return Err(DashboardError::Busy(self.action));
        }
        Ok(FlightGuard { busy: &self.busy })
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

struct FlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Client-side state of the analysis dashboard.
///
/// Every component sits behind its own lock; no lock is held across a
/// network await, so handlers always observe the latest committed state.
pub struct Dashboard<B> {
    backend: B,
    config: Config,
    session: Mutex<SessionState>,
    form: Mutex<OperationForm>,
    panels: Mutex<Panels>,
    selected_file: Mutex<Option<UploadFile>>,
    kpis: Mutex<KpiAnimator>,
    charts: Mutex<ChartManager>,
    upload_flight: InFlight,
    analysis_flight: InFlight,
}

impl<B> Dashboard<B> {
    pub fn new(backend: B, config: Config) -> Self {
        let kpis = KpiAnimator::new(config.kpi_animation);
        Self {
            backend,
            config,
            session: Mutex::new(SessionState::default()),
            form: Mutex::new(OperationForm::default()),
            panels: Mutex::new(Panels::default()),
            selected_file: Mutex::new(None),
            kpis: Mutex::new(kpis),
            charts: Mutex::new(ChartManager::new()),
            upload_flight: InFlight::new("upload"),
            analysis_flight: InFlight::new("analysis"),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> SessionState {
        self.session.lock().clone()
    }

    pub fn form_state(&self) -> FormState {
        self.form.lock().state.clone()
    }

    pub fn view(&self) -> DashboardView {
        let panels = self.panels.lock().clone();
        let form = self.form.lock().layout.clone();
        DashboardView {
            file_label: panels.file_label,
            preview: panels.preview,
            result: panels.result,
            form,
            kpis: self.kpis.lock().displays(),
            chart: self.charts.lock().current().map(|chart| chart.config().clone()),
        }
    }

    pub fn live_charts(&self) -> usize {
        self.charts.lock().live_instances()
    }

    pub fn is_busy(&self) -> bool {
        self.upload_flight.is_busy() || self.analysis_flight.is_busy()
    }

    pub fn select_file(&self, file: UploadFile) {
        self.panels.lock().file_label = Panel::Markup(format!("Selected: <b>{}</b>", file.name));
        *self.selected_file.lock() = Some(file);
    }

    /// Returns false when no dataset is loaded; the form is left untouched.
    pub fn on_operation_changed(&self, operation: OperationKind) -> bool {
        let session = self.session.lock();
        self.form.lock().on_operation_changed(&session, operation)
    }

    pub fn select_column(&self, column: &str) -> Result<()> {
        self.form.lock().select_column(column)
    }

    pub fn select_group_column(&self, column: &str) -> Result<()> {
        self.form.lock().select_group_column(column)
    }

    pub fn set_top_n(&self, raw: impl Into<String>) {
        self.form.lock().set_top_n(raw);
    }

    pub fn set_aggregation(&self, agg: Aggregation) {
        self.form.lock().set_aggregation(agg);
    }

    pub fn set_chart_type(&self, chart_type: ChartType) {
        self.form.lock().set_chart_type(chart_type);
    }

    pub fn export_chart_png(&self, path: &Path) -> Result<()> {
        self.charts.lock().export_png(path)
    }

    /// Waits until every KPI animation has reached its target.
    pub async fn settle(&self) {
        let frame = self.config.kpi_animation.frame_interval;
        loop {
            let animating = self.kpis.lock().is_animating();
            if !animating {
                break;
            }
            tokio::time::sleep(frame).await;
        }
    }

    fn show_result(&self, panel: Panel) {
        self.panels.lock().result = panel;
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{dashboard, ScriptedBackend};
    use super::*;

    #[test]
    fn second_flight_is_rejected_until_the_first_lands() {
        let flight = InFlight::new("upload");
        let guard = flight.begin().unwrap();
        assert!(matches!(flight.begin(), Err(DashboardError::Busy("upload"))));
        drop(guard);
        assert!(flight.begin().is_ok());
    }

    #[test]
    fn selecting_a_file_labels_it() {
        let dash = dashboard(ScriptedBackend::default());
        dash.select_file(UploadFile::new("sales.csv", "A,B\n"));
        assert_eq!(dash.view().file_label.text(), "Selected: sales.csv");
    }

    #[test]
    fn operation_change_before_upload_is_ignored() {
        let dash = dashboard(ScriptedBackend::default());
        assert!(!dash.on_operation_changed(OperationKind::Sum));
        assert_eq!(dash.form_state().operation, None);
    }
}
