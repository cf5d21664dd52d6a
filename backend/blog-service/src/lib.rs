pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod validators;

pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, Result};
