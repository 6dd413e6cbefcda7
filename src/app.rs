use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use handlebars::Handlebars;
use log::{error, info};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::DashboardConfig;
use crate::dashboard::{ViewKind, build_payload};
use crate::error::DashboardError;
use crate::filter::CategoryFilter;
use crate::graph;
use crate::loader::{Dataset, DatasetCache};

const INDEX_TEMPLATE: &str = "index";

/// Shared, read-only state of the web server
pub struct AppState {
    config: DashboardConfig,
    dataset: DatasetCache,
    templates: Handlebars<'static>,
}

impl AppState {
    /// Prepare the state; the dataset itself is loaded on the first request
    pub fn new(config: DashboardConfig) -> Result<Self, DashboardError> {
        let mut templates = Handlebars::new();
        templates
            .register_template_string(INDEX_TEMPLATE, include_str!("./static/index.hbs"))
            .map_err(|e| DashboardError::Render(e.to_string()))?;

        Ok(Self {
            dataset: DatasetCache::new(&config.data_path),
            config,
            templates,
        })
    }
}

#[derive(Deserialize)]
struct ChartQuery {
    category: Option<String>,
}

/// Build the router with every dashboard route
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(serve_index))
        .route("/update_plots/:category", get(update_plots))
        .route("/chart/:view", get(serve_chart))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    info!("Serving reviews from {}", config.data_path.display());

    // Setup app state
    let app_state = Arc::new(AppState::new(config)?);
    let app = create_router(app_state);

    // Start server
    let listener = TcpListener::bind(bind_addr.as_str()).await?;
    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index(State(state): State<Arc<AppState>>) -> Response {
    let dataset = match load_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(e) => return error_response(e),
    };

    match render_index(&state, &dataset) {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_plots(
    Path(category): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Refreshing plots for category: {}", category);

    let dataset = match load_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(e) => return error_response(e),
    };

    let filter = CategoryFilter::from_param(Some(&category));
    Json(build_payload(&dataset, &filter, &ViewKind::REFRESH, &state.config)).into_response()
}

async fn serve_chart(
    Path(view): Path<String>,
    Query(params): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(kind) = ViewKind::from_slug(&view) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let dataset = match load_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(e) => return error_response(e),
    };

    let filter = CategoryFilter::from_param(params.category.as_deref());
    let rendered = graph::render_view_png(kind, &dataset, &filter, &state.config)
        .map_err(|e| DashboardError::Render(e.to_string()));

    match rendered {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => error_response(e),
    }
}

/// Shared dataset, parsed on the blocking pool the first time
async fn load_dataset(state: &Arc<AppState>) -> Result<Arc<Dataset>, DashboardError> {
    let state = Arc::clone(state);
    let dataset = tokio::task::spawn_blocking(move || state.dataset.get()).await??;
    Ok(dataset)
}

fn render_index(state: &AppState, dataset: &Dataset) -> Result<String, DashboardError> {
    let payload = build_payload(dataset, &CategoryFilter::All, &ViewKind::ALL, &state.config);

    let mut context = Map::new();
    for (key, figure) in payload {
        context.insert(key, Value::String(embed_json(&figure)));
    }
    context.insert("categories".to_string(), json!(dataset.selector_categories()));

    state
        .templates
        .render(INDEX_TEMPLATE, &context)
        .map_err(|e| DashboardError::Render(e.to_string()))
}

/// JSON that can sit inside a `<script>` element
fn embed_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn error_response(e: DashboardError) -> Response {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}
