// src/lib.rs

pub mod config;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod reddit;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod view;

// Re-export specific items for convenience if needed
pub use routes::create_router;
