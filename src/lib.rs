// Library surface for the binary and the headless integration tests.
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod details;
pub mod forms;
pub mod local_store;
pub mod logging;
pub mod module;
pub mod notify;
pub mod runtime;
pub mod time_format;
pub mod tracker;
pub mod ui;
pub mod view_model;
pub mod worker;
