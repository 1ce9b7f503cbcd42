//! Client-side controller of the sheet analysis dashboard: dataset upload,
//! operation form, analyze requests, animated KPIs and the rendered chart.

pub mod config;
pub mod controllers;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod session;
pub mod view;

pub use config::{load_config, AnimationTiming, Config};
pub use controllers::Dashboard;
pub use error::{DashboardError, Result};
pub use models::{
    Aggregation, AnalysisRequest, AnalysisResult, ChartSpec, ChartType, DatasetMetadata, KpiKey,
    KpiSet, OperationKind,
};
pub use services::{Backend, HttpBackend, UploadFile};
pub use session::SessionState;
pub use view::{DashboardView, Panel};
