pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mock_data;
pub mod models;
pub mod panel;
pub mod resources;
pub mod routes;
pub mod slug;
pub mod state;
pub mod validation;

pub use config::Settings;
pub use error::AppError;
pub use state::AppState;
