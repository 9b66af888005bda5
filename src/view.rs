use crate::charts::{BarChart, TimelineChart};
use crate::controller::Phase;
use crate::models::Company;
use crate::stats::MetricsSummary;
use crate::table::{MentionCard, TableSpec};
use serde::Serialize;
use serde_json::Value;

/// Everything shown for one company, built in full before any of it is shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub company: Option<Company>,
    pub metrics: MetricsSummary,
    pub distribution: BarChart,
    pub timeline: TimelineChart,
    pub table: TableSpec,
    pub recent: Vec<MentionCard>,
}

/// The page regions the controller writes to.
pub trait DashboardView: Send {
    fn set_loading(&mut self, loading: bool);

    fn set_companies(&mut self, companies: &[Company], selected: Option<i64>);

    fn set_selected(&mut self, company_id: Option<i64>);

    /// Replaces the whole content area and hides any error notice.
    fn render(&mut self, frame: DashboardFrame);

    fn render_charts(&mut self, distribution: BarChart, timeline: TimelineChart);

    fn render_table(&mut self, table: TableSpec);

    /// Hides the content area and shows the notice instead.
    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyOption {
    pub id: i64,
    pub label: String,
}

impl From<&Company> for CompanyOption {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            label: format!("{} (ID: {})", company.name, company.id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub loading: bool,
    pub companies: Vec<CompanyOption>,
    pub selected_company_id: Option<i64>,
    pub content: Option<DashboardFrame>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewResponse {
    pub phase: Phase,
    #[serde(flatten)]
    pub view: DashboardSnapshot,
}

/// Plotly-ready chart specs after a viewport change.
#[derive(Debug, Clone, Serialize)]
pub struct ChartsResponse {
    pub distribution: Value,
    pub timeline: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentionsResponse {
    pub table: TableSpec,
    pub html: String,
    pub timeline: Value,
}

/// Keeps the last state of every region so it can be rendered on demand.
#[derive(Debug, Default)]
pub struct SnapshotView {
    snapshot: DashboardSnapshot,
}

impl SnapshotView {
    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }
}

impl DashboardView for SnapshotView {
    fn set_loading(&mut self, loading: bool) {
        self.snapshot.loading = loading;
    }

    fn set_companies(&mut self, companies: &[Company], selected: Option<i64>) {
        self.snapshot.companies = companies.iter().map(CompanyOption::from).collect();
        self.snapshot.selected_company_id = selected;
    }

    fn set_selected(&mut self, company_id: Option<i64>) {
        self.snapshot.selected_company_id = company_id;
    }

    fn render(&mut self, frame: DashboardFrame) {
        self.snapshot.content = Some(frame);
        self.snapshot.error = None;
    }

    fn render_charts(&mut self, distribution: BarChart, timeline: TimelineChart) {
        if let Some(content) = self.snapshot.content.as_mut() {
            content.distribution = distribution;
            content.timeline = timeline;
        }
    }

    fn render_table(&mut self, table: TableSpec) {
        if let Some(content) = self.snapshot.content.as_mut() {
            content.table = table;
        }
    }

    fn show_error(&mut self, message: &str) {
        self.snapshot.content = None;
        self.snapshot.error = Some(message.to_string());
    }
}
