//! HTTP presentation shells.
//!
//! Both shells are thin callers of [`RatingService`]: the multi-page shell
//! re-renders a server-side template per submission, the single-page shell
//! serves a static client that talks to a JSON API.

pub mod pages;
pub mod spa;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use minijinja::Environment;
use std::sync::Arc;
use tracing::error;

use crate::config::ShellKind;
use crate::metrics::{MetricsSnapshot, ServiceMetrics};
use crate::service::RatingService;

/// Shared application state, built once before the server starts
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RatingService>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(service: Arc<RatingService>) -> Result<Self> {
        let mut templates = Environment::new();
        templates
            .add_template(pages::HOME_TEMPLATE, include_str!("../../templates/home.html"))
            .context("Failed to compile page template")?;

        Ok(Self {
            service,
            templates: Arc::new(templates),
        })
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        self.service.metrics()
    }
}

/// Errors a shell handler can answer with
#[derive(Debug)]
pub enum ShellError {
    UnknownMovie(String),
    Render(minijinja::Error),
}

impl From<minijinja::Error> for ShellError {
    fn from(e: minijinja::Error) -> Self {
        ShellError::Render(e)
    }
}

impl IntoResponse for ShellError {
    fn into_response(self) -> Response {
        match self {
            ShellError::UnknownMovie(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown movie: {id}")).into_response()
            }
            ShellError::Render(e) => {
                error!(error = %e, "Template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Build the router with the requested shells mounted
pub fn router(state: AppState, shells: &[ShellKind]) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics));

    if shells.contains(&ShellKind::Pages) {
        app = app.merge(pages::routes());
    }
    if shells.contains(&ShellKind::Spa) {
        app = app.merge(spa::routes());
    }

    app.with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics().snapshot())
}
