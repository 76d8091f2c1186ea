pub mod app;
pub mod config;
pub mod domain;
pub mod downloads;
pub mod error;
pub mod manifest;
pub mod materials;
pub mod output;
pub mod query;
pub mod seed;
pub mod state;
pub mod store;
