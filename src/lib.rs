pub mod api;
pub mod blueprint;
pub mod check;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod materialize;
pub mod preview;
pub mod transactions;
mod utils;

pub use api::LampgenError;
pub use manifest::{FileSpec, Manifest};
pub use materialize::{materialize, ScaffoldError};
