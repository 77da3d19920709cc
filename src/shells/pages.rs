//! Multi-page shell: one server-rendered page, re-rendered per submission

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use super::{AppState, ShellError};
use crate::catalog;
use crate::service::{ReviewError, ReviewOutcome, GENERIC_FAILURE_MESSAGE};
use crate::types::{Movie, ReviewInput};

pub const HOME_TEMPLATE: &str = "home.html";

/// Fields posted by the review form
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub movie: String,
    pub review: String,
}

/// What the page shows below the form
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PageResult {
    Rating { rating: u8, movie: &'static Movie },
    Message { message: &'static str },
    Error { message: &'static str },
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
}

async fn home(State(state): State<AppState>) -> Result<Html<String>, ShellError> {
    render(&state, None, "", None)
}

async fn predict(
    State(state): State<AppState>,
    Form(form): Form<ReviewForm>,
) -> Result<(StatusCode, Html<String>), ShellError> {
    let input = ReviewInput::new(form.movie, form.review);

    let (status, result) = match state.service.review(&input) {
        Ok(ReviewOutcome::Rated { movie, prediction }) => (
            StatusCode::OK,
            PageResult::Rating {
                rating: prediction.rating.value(),
                movie,
            },
        ),
        Ok(ReviewOutcome::Rejected { rejection, .. }) => (
            StatusCode::OK,
            PageResult::Message {
                message: rejection.message(),
            },
        ),
        Err(ReviewError::UnknownMovie(id)) => return Err(ShellError::UnknownMovie(id)),
        Err(ReviewError::Prediction(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            PageResult::Error {
                message: GENERIC_FAILURE_MESSAGE,
            },
        ),
    };

    let page = render(&state, Some(&input.movie), &input.review, Some(result))?;
    Ok((status, page))
}

fn render(
    state: &AppState,
    selected: Option<&str>,
    review: &str,
    result: Option<PageResult>,
) -> Result<Html<String>, ShellError> {
    let template = state.templates.get_template(HOME_TEMPLATE)?;
    let html = template.render(context! {
        movies => catalog::movies(),
        selected => selected,
        review => review,
        result => result,
    })?;
    Ok(Html(html))
}
