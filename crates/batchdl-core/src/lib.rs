pub mod config;
pub mod logging;

pub mod batch;
pub mod control;
pub mod engine;
pub mod job;
pub mod progress;
pub mod scheduler;
pub mod store;
pub mod url_model;
