//! Domain data structures

pub mod movie;
pub mod review;

pub use movie::Movie;
pub use review::{Rating, Rejection, ReviewInput};
