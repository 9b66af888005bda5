use crate::errors::{AppError, LoadError};
use crate::models::{MentionsParams, SelectRequest, Viewport};
use crate::state::AppState;
use crate::storage::{is_data_resource, read_resource};
use crate::table::TableQuery;
use crate::ui::render_index;
use crate::view::{ChartsResponse, MentionsResponse, ViewResponse};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let page = state
        .controller
        .inspect(|phase, view| render_index(phase, view.snapshot()))
        .await;
    Html(page)
}

/// Form fallback for the selector; failures surface as the page notice.
pub async fn select_form(
    State(state): State<AppState>,
    Form(form): Form<SelectRequest>,
) -> Redirect {
    if let Err(err) = state.controller.select_company(form.company_id).await {
        warn!("selecting company {} failed: {err}", form.company_id);
    }
    Redirect::to("/")
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewResponse> {
    Json(current_view(&state).await)
}

pub async fn select(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<ViewResponse>, AppError> {
    state.controller.select_company(payload.company_id).await?;
    Ok(Json(current_view(&state).await))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<ViewResponse>, AppError> {
    state.controller.refresh().await?;
    Ok(Json(current_view(&state).await))
}

pub async fn resize(
    State(state): State<AppState>,
    Json(viewport): Json<Viewport>,
) -> Result<Json<ChartsResponse>, AppError> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(AppError::bad_request("width and height must be positive"));
    }
    if !state.controller.resize(viewport).await {
        return Err(AppError::conflict("no dashboard is displayed"));
    }

    let charts = state
        .controller
        .inspect(|_, view| {
            view.snapshot().content.as_ref().map(|content| ChartsResponse {
                distribution: content.distribution.to_plotly(),
                timeline: content.timeline.to_plotly(),
            })
        })
        .await;
    charts
        .map(Json)
        .ok_or_else(|| AppError::conflict("no dashboard is displayed"))
}

pub async fn mentions(
    State(state): State<AppState>,
    Query(params): Query<MentionsParams>,
) -> Result<Json<MentionsResponse>, AppError> {
    let query = TableQuery::from_params(&params).map_err(AppError::bad_request)?;
    let Some(table) = state.controller.set_table_query(query).await else {
        return Err(AppError::conflict("no dashboard is displayed"));
    };

    let timeline = state
        .controller
        .inspect(|_, view| {
            view.snapshot()
                .content
                .as_ref()
                .map(|content| content.timeline.to_plotly())
        })
        .await
        .unwrap_or_default();

    Ok(Json(MentionsResponse {
        html: table.to_html(),
        table,
        timeline,
    }))
}

pub async fn data_asset(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_data_resource(&file) {
        return Err(AppError::not_found(format!("no data file named {file}")));
    }

    match read_resource(&state.data_dir, &file).await {
        Ok(body) => Ok(([(header::CONTENT_TYPE, "application/json")], body)),
        Err(LoadError::Fetch { status: 404, .. }) => {
            Err(AppError::not_found(format!("no data file named {file}")))
        }
        Err(err) => Err(AppError::internal(err)),
    }
}

async fn current_view(state: &AppState) -> ViewResponse {
    state
        .controller
        .inspect(|phase, view| ViewResponse {
            phase,
            view: view.snapshot().clone(),
        })
        .await
}
