//! HTTP API handlers for arpx-pub

pub mod health;
pub mod ui;
pub mod upload;

pub use health::health_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
