//! HTTP API handlers for igbo-upload

pub mod health;
pub mod submissions;
pub mod ui;

pub use health::health_routes;
pub use submissions::submission_routes;
pub use ui::ui_routes;
