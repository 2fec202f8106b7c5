pub mod api;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod render;
pub mod stream;
