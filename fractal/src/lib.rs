#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod dao;
pub mod errors;
pub mod scenario;
mod util;
