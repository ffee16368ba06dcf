pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod middleware;
pub mod state;

pub use api::create_api_router;
pub use config::AppConfig;
pub use state::AppState;
