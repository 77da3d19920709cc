//! Single-page shell: a static reactive client plus the JSON API it calls

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AppState, ShellError};
use crate::catalog;
use crate::service::{ReviewError, ReviewOutcome, GENERIC_FAILURE_MESSAGE};
use crate::types::{Movie, Rating, Rejection, ReviewInput};

const APP_PAGE: &str = include_str!("../../templates/app.html");

/// Body returned by `POST /api/reviews`
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewResponse {
    Rated {
        movie: &'static Movie,
        rating: Rating,
        predicted_at: DateTime<Utc>,
    },
    Rejected {
        reason: Rejection,
        message: &'static str,
    },
    Error {
        message: &'static str,
    },
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/app", get(app_page))
        .route("/api/movies", get(list_movies))
        .route("/api/reviews", post(submit_review))
}

async fn app_page() -> Html<&'static str> {
    Html(APP_PAGE)
}

async fn list_movies() -> Json<&'static [Movie]> {
    Json(catalog::movies())
}

async fn submit_review(
    State(state): State<AppState>,
    Json(input): Json<ReviewInput>,
) -> Result<Response, ShellError> {
    let response = match state.service.review(&input) {
        Ok(ReviewOutcome::Rated { movie, prediction }) => (
            StatusCode::OK,
            ReviewResponse::Rated {
                movie,
                rating: prediction.rating,
                predicted_at: Utc::now(),
            },
        ),
        Ok(ReviewOutcome::Rejected { rejection, .. }) => (
            StatusCode::OK,
            ReviewResponse::Rejected {
                reason: rejection,
                message: rejection.message(),
            },
        ),
        Err(ReviewError::UnknownMovie(id)) => return Err(ShellError::UnknownMovie(id)),
        Err(ReviewError::Prediction(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ReviewResponse::Error {
                message: GENERIC_FAILURE_MESSAGE,
            },
        ),
    };

    let (status, body) = response;
    Ok((status, Json(body)).into_response())
}
