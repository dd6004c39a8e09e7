pub mod analyzers;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod services;
pub mod state;
