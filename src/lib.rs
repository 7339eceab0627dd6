pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod models;
pub mod services;
