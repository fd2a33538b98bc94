//! Core library for the `lode` CLI.
//!
//! `lode` fires HTTP requests at a fixed rate from a pool of concurrent
//! workers, records when each request passed through DNS, connect, TLS,
//! first byte and completion, and reports status code and latency
//! breakdowns. Runs can be saved as records and replayed, and suites of
//! runs can be checked against assertions on the responses.
pub mod app;
pub mod args;
pub mod assertions;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod record;
pub mod shutdown;
pub mod shutdown_handlers;
