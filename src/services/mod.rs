pub mod backend;
pub mod chart;
pub mod form;
pub mod kpi;

pub use backend::{Backend, HttpBackend, UploadFile};
pub use chart::{Chart, ChartConfig, ChartManager};
pub use form::{AuxControls, FormLayout, FormState, OperationForm, OperationFormBuilder};
pub use kpi::{KpiAnimator, KpiDisplays};
