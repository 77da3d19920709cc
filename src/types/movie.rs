//! Movie display records

use serde::Serialize;

/// A movie that can be reviewed. Display-only: never fed to the models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    /// Stable identifier used by forms and the JSON API
    pub id: &'static str,
    pub title: &'static str,
    pub poster_url: &'static str,
}
