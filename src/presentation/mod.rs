// Presentation layer - Local operator HTTP API
pub mod app_state;
pub mod handlers;
