// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod caret;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod problems;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod store;
pub mod submit;
pub mod time_series;
pub mod typing_policy;
pub mod ui;
