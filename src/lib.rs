//! Library exports for authsync, shared between embedders and tests.

pub mod cache;
pub mod callback;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod models;
pub mod nav;
pub mod provider;
pub mod sanitize;
pub mod store;
pub mod utils;
