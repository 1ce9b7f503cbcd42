use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column names of the loaded dataset, as reported by the backend after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatasetMetadata {
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
}

impl DatasetMetadata {
    /// Keeps the order of both lists; numeric columns not present in `columns` are dropped.
    pub fn new(columns: Vec<String>, numeric_columns: Vec<String>) -> Self {
        let numeric_columns = numeric_columns
            .into_iter()
            .filter(|name| columns.contains(name))
            .collect();
        Self { columns, numeric_columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column source for the value selector of `operation`.
    pub fn columns_for(&self, operation: OperationKind) -> &[String] {
        if operation.uses_numeric_columns() {
            &self.numeric_columns
        } else {
            &self.columns
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Top,
    Sum,
    Average,
    Group,
    Count,
    Unique,
}

impl OperationKind {
    pub const ALL: [Self; 6] = [
        Self::Top,
        Self::Sum,
        Self::Average,
        Self::Group,
        Self::Count,
        Self::Unique,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Group => "group",
            Self::Count => "count",
            Self::Unique => "unique",
        }
    }

    /// Operations whose value column must be numeric.
    pub fn uses_numeric_columns(self) -> bool {
        matches!(self, Self::Top | Self::Sum | Self::Average | Self::Group)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown operation '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            other => Err(format!("Unknown aggregation '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Scatter,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Scatter => "scatter",
        }
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "scatter" => Ok(Self::Scatter),
            other => Err(format!("Unknown chart type '{}'", other)),
        }
    }
}

/// Body of the analyze request. Auxiliary fields are only serialized for their operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub operation: OperationKind,
    pub column: String,
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_col: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agg: Option<Aggregation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KpiKey {
    Rows,
    Sum,
    Avg,
    Max,
    Min,
}

impl KpiKey {
    pub const ALL: [Self; 5] = [Self::Rows, Self::Sum, Self::Avg, Self::Max, Self::Min];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "rows",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// The five summary numbers. Missing or non-numeric values read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "HashMap<String, Value>")]
pub struct KpiSet {
    values: [f64; 5],
}

impl KpiSet {
    pub fn get(&self, key: KpiKey) -> f64 {
        self.values[key.index()]
    }

    pub fn with(mut self, key: KpiKey, value: f64) -> Self {
        self.values[key.index()] = sanitize(value);
        self
    }
}

impl From<HashMap<String, Value>> for KpiSet {
    fn from(raw: HashMap<String, Value>) -> Self {
        KpiKey::ALL.into_iter().fold(KpiSet::default(), |set, key| {
            let value = raw.get(key.as_str()).map(coerce_number).unwrap_or(0.0);
            set.with(key, value)
        })
    }
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub result_markup: String,
    pub kpis: Option<KpiSet>,
    pub chart: Option<ChartSpec>,
}

/// Successful upload payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDataset {
    pub metadata: DatasetMetadata,
    pub preview: String,
}

/// Raw JSON of `/upload`: either `{error}` or the dataset description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

impl UploadResponse {
    /// Splits the response into the server-reported error or the dataset.
    pub fn into_outcome(self) -> Result<UploadedDataset, String> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(error);
        }
        if self.columns.is_empty() {
            return Err("Uploaded dataset has no columns".to_string());
        }
        Ok(UploadedDataset {
            metadata: DatasetMetadata::new(self.columns, self.numeric_columns),
            preview: self.preview.unwrap_or_default(),
        })
    }
}

/// Raw JSON of `/analyze`: either `{error}` or `{result, kpis?, chart?}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub kpis: Option<KpiSet>,
    #[serde(default)]
    pub chart: Option<ChartSpec>,
}

impl AnalyzeResponse {
    pub fn into_outcome(self) -> Result<AnalysisResult, String> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(error);
        }
        Ok(AnalysisResult {
            result_markup: self.result.unwrap_or_default(),
            kpis: self.kpis,
            chart: self.chart,
        })
    }
}
