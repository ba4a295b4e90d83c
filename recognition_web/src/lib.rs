mod routes;
mod server;
mod telemetry;
mod templates;
#[cfg(test)]
mod test_utils;

pub mod app;
pub mod config;

pub use app::start_app;
