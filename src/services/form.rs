use crate::error::{DashboardError, Result};
use crate::models::{Aggregation, ChartType, DatasetMetadata, OperationKind};
use crate::session::SessionState;

pub const COLUMN_PLACEHOLDER: &str = "Select operation first";
const DEFAULT_TOP_N: &str = "5";

/// Operation-specific inputs. At most one group is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuxControls {
    #[default]
    Hidden,
    TopN,
    Group,
}

/// What the operation form currently offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayout {
    pub column_options: Vec<String>,
    /// Shown instead of options until an operation is chosen.
    pub column_placeholder: Option<String>,
    pub group_options: Vec<String>,
    pub aux: AuxControls,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self {
            column_options: Vec::new(),
            column_placeholder: Some(COLUMN_PLACEHOLDER.to_string()),
            group_options: Vec::new(),
            aux: AuxControls::Hidden,
        }
    }
}

impl FormLayout {
    pub fn top_n_visible(&self) -> bool {
        self.aux == AuxControls::TopN
    }

    pub fn group_visible(&self) -> bool {
        self.aux == AuxControls::Group
    }
}

/// The user's current selections, updated by form events only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub operation: Option<OperationKind>,
    pub column: Option<String>,
    pub chart_type: ChartType,
    /// Raw text of the top-N input.
    pub top_n: String,
    pub group_col: Option<String>,
    pub agg: Aggregation,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            operation: None,
            column: None,
            chart_type: ChartType::default(),
            top_n: DEFAULT_TOP_N.to_string(),
            group_col: None,
            agg: Aggregation::default(),
        }
    }
}

pub struct OperationFormBuilder;

impl OperationFormBuilder {
    /// Builds the layout for `operation` from scratch; nothing of a previous layout survives.
    pub fn layout_for(metadata: &DatasetMetadata, operation: OperationKind) -> FormLayout {
        let aux = match operation {
            OperationKind::Top => AuxControls::TopN,
            OperationKind::Group => AuxControls::Group,
            _ => AuxControls::Hidden,
        };
        let group_options = if aux == AuxControls::Group {
            metadata.columns.clone()
        } else {
            Vec::new()
        };

        FormLayout {
            column_options: metadata.columns_for(operation).to_vec(),
            column_placeholder: None,
            group_options,
            aux,
        }
    }
}

/// Selections plus the layout they were made against.
#[derive(Debug, Clone, Default)]
pub struct OperationForm {
    pub state: FormState,
    pub layout: FormLayout,
}

impl OperationForm {
    /// Back to the unselected state shown right after an upload.
    pub fn clear(&mut self) {
        let chart_type = self.state.chart_type;
        self.state = FormState {
            chart_type,
            ..FormState::default()
        };
        self.layout = FormLayout::default();
    }

    /// Returns false (and changes nothing) when no dataset is loaded.
    pub fn on_operation_changed(&mut self, session: &SessionState, operation: OperationKind) -> bool {
        let Some(metadata) = session.metadata() else {
            tracing::debug!("Ignoring operation change to {} without a dataset", operation);
            return false;
        };

        self.layout = OperationFormBuilder::layout_for(metadata, operation);
        self.state.operation = Some(operation);
        self.state.column = self.layout.column_options.first().cloned();
        self.state.group_col = self.layout.group_options.first().cloned();
        tracing::debug!(
            "Operation {} offers {} columns",
            operation,
            self.layout.column_options.len()
        );
        true
    }

    pub fn select_column(&mut self, column: &str) -> Result<()> {
        if !self.layout.column_options.iter().any(|c| c == column) {
            return Err(DashboardError::Validation(format!(
                "Column '{}' is not available for this operation",
                column
            )));
        }
        self.state.column = Some(column.to_string());
        Ok(())
    }

    pub fn select_group_column(&mut self, column: &str) -> Result<()> {
        if !self.layout.group_options.iter().any(|c| c == column) {
            return Err(DashboardError::Validation(format!(
                "Group column '{}' is not available",
                column
            )));
        }
        self.state.group_col = Some(column.to_string());
        Ok(())
    }

    pub fn set_top_n(&mut self, raw: impl Into<String>) {
        self.state.top_n = raw.into();
    }

    pub fn set_aggregation(&mut self, agg: Aggregation) {
        self.state.agg = agg;
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.state.chart_type = chart_type;
    }
}
