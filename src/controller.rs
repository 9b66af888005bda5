//! The dashboard state machine.
//!
//! `Idle -> LoadingCompanies -> LoadingDashboard -> Ready`, with `Error`
//! reachable from both loading phases. The controller is the only owner of
//! mutable dashboard state. Its lock is never held while a fetch is in flight,
//! so several events can be in progress at once; every dashboard load takes a
//! ticket from a monotonically increasing sequence and a response whose ticket
//! is no longer current is dropped instead of overwriting newer state.

use crate::charts::{
    BarChart, ChartLayout, ChartSlot, TimelineChart, build_distribution_chart, build_timeline_chart,
};
use crate::errors::LoadError;
use crate::loader::DashboardSource;
use crate::models::{DashboardPayload, Viewport};
use crate::stats::summarize;
use crate::table::{
    RECENT_LIMIT, TableQuery, TableSpec, filter_timeline, recent_mentions, render_mentions_page,
};
use crate::view::{DashboardFrame, DashboardView};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub const LOAD_ERROR_NOTICE: &str = "Error loading data. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    LoadingCompanies,
    LoadingDashboard,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rendered,
    /// Nothing to do: the request matches what is already shown or on its way.
    Unchanged,
    /// A newer request started while this one was in flight.
    Superseded,
}

struct Inner<V> {
    phase: Phase,
    view: V,
    payload: Option<DashboardPayload>,
    displayed_id: Option<i64>,
    pending_id: Option<i64>,
    sequence: u64,
    viewport: Viewport,
    query: TableQuery,
    companies_loaded: bool,
}

pub struct Controller<S, V> {
    source: S,
    inner: Mutex<Inner<V>>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<S, V> Controller<S, V>
where
    S: DashboardSource,
    V: DashboardView,
{
    pub fn new(source: S, view: V) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                view,
                payload: None,
                displayed_id: None,
                pending_id: None,
                sequence: 0,
                viewport: Viewport::default(),
                query: TableQuery::default(),
                companies_loaded: false,
            }),
            today: local_today,
        }
    }

    /// Fixes the date used by rolling "last N days" filters.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.phase
    }

    pub async fn current_company_id(&self) -> Option<i64> {
        self.inner.lock().await.displayed_id
    }

    pub async fn inspect<R>(&self, read: impl FnOnce(Phase, &V) -> R) -> R {
        let inner = self.inner.lock().await;
        read(inner.phase, &inner.view)
    }

    /// Loads the companies list, selects the lowest id and shows its dashboard.
    /// An empty list falls back to the default dashboard resource.
    pub async fn start(&self) -> Result<Outcome, LoadError> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            if inner.phase == Phase::LoadingCompanies {
                return Ok(Outcome::Unchanged);
            }
            inner.sequence += 1;
            inner.phase = Phase::LoadingCompanies;
            inner.view.set_loading(true);
            inner.sequence
        };

        let loaded = self.source.load_companies().await;

        let default_id = {
            let mut inner = self.inner.lock().await;
            let companies = match loaded {
                Ok(companies) => companies,
                Err(err) if inner.sequence == ticket => {
                    inner.fail(&err);
                    return Err(err);
                }
                Err(err) => {
                    debug!("ignoring companies failure after a newer request: {err}");
                    return Ok(Outcome::Superseded);
                }
            };

            info!("loaded {} companies", companies.len());
            inner.companies_loaded = true;
            if inner.sequence != ticket {
                let selected = inner.pending_id.or(inner.displayed_id);
                inner.view.set_companies(&companies, selected);
                return Ok(Outcome::Superseded);
            }

            let default_id = companies.iter().map(|company| company.id).min();
            inner.view.set_companies(&companies, default_id);
            default_id
        };

        self.load(default_id).await
    }

    /// Shows another company. Asking for the company already on screen (or
    /// already being fetched) does not touch the source.
    pub async fn select_company(&self, company_id: i64) -> Result<Outcome, LoadError> {
        {
            let mut inner = self.inner.lock().await;
            let visible = matches!(inner.phase, Phase::Ready | Phase::LoadingDashboard)
                && inner.payload.is_some();
            if visible && inner.displayed_id == Some(company_id) {
                if inner.phase == Phase::LoadingDashboard {
                    // Back to what is on screen: drop the pending load.
                    inner.sequence += 1;
                    inner.pending_id = None;
                    inner.phase = Phase::Ready;
                    inner.view.set_loading(false);
                    inner.view.set_selected(Some(company_id));
                }
                debug!("company {company_id} already displayed");
                return Ok(Outcome::Unchanged);
            }
            if inner.phase == Phase::LoadingDashboard && inner.pending_id == Some(company_id) {
                debug!("company {company_id} already loading");
                return Ok(Outcome::Unchanged);
            }
        }

        self.load(Some(company_id)).await
    }

    /// Fetches the shown company again, or restarts when nothing was loaded.
    pub async fn refresh(&self) -> Result<Outcome, LoadError> {
        let target = {
            let inner = self.inner.lock().await;
            if !inner.companies_loaded {
                None
            } else {
                Some(inner.pending_id.or(inner.displayed_id))
            }
        };

        match target {
            None => self.start().await,
            Some(company_id) => self.load(company_id).await,
        }
    }

    /// Rebuilds both charts for a new viewport from the held payload.
    /// Returns `false` when there is nothing on screen to redraw.
    pub async fn resize(&self, viewport: Viewport) -> bool {
        let today = (self.today)();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.viewport = viewport;

        if inner.phase != Phase::Ready {
            return false;
        }
        let Some(payload) = inner.payload.as_ref() else {
            return false;
        };

        let (distribution, timeline) = build_charts(payload, viewport, &inner.query, today);
        inner.view.render_charts(distribution, timeline);
        debug!("charts rebuilt for {}x{}", viewport.width, viewport.height);
        true
    }

    /// Applies table filters to the held payload; the timeline follows the
    /// same date window. Returns the new table when something is on screen.
    pub async fn set_table_query(&self, query: TableQuery) -> Option<TableSpec> {
        let today = (self.today)();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let shown = match inner.payload.as_ref() {
            Some(payload) if inner.phase == Phase::Ready => payload,
            _ => {
                inner.query = query;
                return None;
            }
        };

        let table = render_mentions_page(&shown.mentions, &query, today);
        let (distribution, timeline) = build_charts(shown, inner.viewport, &query, today);
        inner.query = query;
        inner.view.render_charts(distribution, timeline);
        inner.view.render_table(table.clone());
        Some(table)
    }

    async fn load(&self, company_id: Option<i64>) -> Result<Outcome, LoadError> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.sequence += 1;
            inner.phase = Phase::LoadingDashboard;
            inner.pending_id = company_id;
            inner.view.set_loading(true);
            if company_id.is_some() {
                inner.view.set_selected(company_id);
            }
            inner.sequence
        };

        let result = self.source.load_dashboard(company_id).await;

        let today = (self.today)();
        let mut inner = self.inner.lock().await;
        if inner.sequence != ticket {
            debug!("discarding stale dashboard response for {company_id:?}");
            return Ok(Outcome::Superseded);
        }
        inner.pending_id = None;

        match result {
            Ok(payload) => {
                inner.show(payload, company_id, today);
                Ok(Outcome::Rendered)
            }
            Err(err) => {
                inner.fail(&err);
                Err(err)
            }
        }
    }
}

impl<V: DashboardView> Inner<V> {
    fn show(&mut self, payload: DashboardPayload, requested: Option<i64>, today: NaiveDate) {
        let shown_id = payload.company.as_ref().map(|company| company.id).or(requested);
        if shown_id != self.displayed_id {
            self.query = TableQuery::default();
        }

        let frame = build_frame(&payload, self.viewport, &self.query, today);
        info!(
            "dashboard ready for {} ({} mentions, {} timeline points)",
            frame.company.as_ref().map_or("default company", |company| company.name.as_str()),
            payload.mentions.len(),
            payload.timeline.len()
        );

        self.payload = Some(payload);
        self.displayed_id = shown_id;
        self.phase = Phase::Ready;
        self.view.set_selected(shown_id);
        self.view.render(frame);
        self.view.set_loading(false);
    }

    fn fail(&mut self, err: &LoadError) {
        error!("dashboard load failed: {err}");
        self.phase = Phase::Error;
        self.pending_id = None;
        self.view.show_error(LOAD_ERROR_NOTICE);
        self.view.set_loading(false);
    }
}

fn build_charts(
    payload: &DashboardPayload,
    viewport: Viewport,
    query: &TableQuery,
    today: NaiveDate,
) -> (BarChart, TimelineChart) {
    let timeline = filter_timeline(&payload.timeline, &query.window, today);
    (
        build_distribution_chart(&payload.stats)
            .with_layout(ChartLayout::for_viewport(viewport, ChartSlot::Half)),
        build_timeline_chart(&timeline)
            .with_layout(ChartLayout::for_viewport(viewport, ChartSlot::Full)),
    )
}

fn build_frame(
    payload: &DashboardPayload,
    viewport: Viewport,
    query: &TableQuery,
    today: NaiveDate,
) -> DashboardFrame {
    let (distribution, timeline) = build_charts(payload, viewport, query, today);
    DashboardFrame {
        company: payload.company.clone(),
        metrics: summarize(&payload.stats),
        distribution,
        timeline,
        table: render_mentions_page(&payload.mentions, query, today),
        recent: recent_mentions(&payload.mentions, RECENT_LIMIT),
    }
}
