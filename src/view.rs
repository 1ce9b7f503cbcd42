use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::chart::ChartConfig;
use crate::services::form::FormLayout;
use crate::services::kpi::KpiDisplays;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([,.;:!?)])").expect("valid punctuation pattern"));

/// One inline display area of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel {
    Message(String),
    Markup(String),
    Error(String),
}

impl Panel {
    pub fn message(text: impl Into<String>) -> Self {
        Panel::Message(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Panel::Error(text.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Panel::Error(_))
    }

    /// Visible text with markup tags removed.
    pub fn text(&self) -> String {
        match self {
            Panel::Message(text) | Panel::Error(text) => text.clone(),
            Panel::Markup(markup) => markup_text(markup),
        }
    }
}

pub fn markup_text(markup: &str) -> String {
    let stripped = TAG_RE.replace_all(markup, " ");
    let collapsed = SPACE_RE.replace_all(stripped.trim(), " ");
    let tightened = PUNCT_RE.replace_all(&collapsed, "$1");
    decode_entities(&tightened)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Point-in-time copy of everything the dashboard shows.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub file_label: Panel,
    pub preview: Panel,
    pub result: Panel,
    pub form: FormLayout,
    pub kpis: KpiDisplays,
    pub chart: Option<ChartConfig>,
}

/// The text areas written by the controllers.
#[derive(Debug, Clone)]
pub(crate) struct Panels {
    pub file_label: Panel,
    pub preview: Panel,
    pub result: Panel,
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            file_label: Panel::message("No file selected"),
            preview: Panel::message("Upload a file to see a preview"),
            result: Panel::message("Waiting for analysis..."),
        }
    }
}
