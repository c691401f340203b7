//! CodeHarness - asynchronous code-execution coordinator.
//!
//! This library accepts code snippets over a service boundary, runs them one
//! at a time on a dedicated interpreter thread, and exposes each submission
//! as a pollable operation that completes exactly once.
//!
//! # High-Level API
//!
//! The [`coordinator`] module wires everything together:
//!
//! ```ignore
//! use codeharness::coordinator::{CoordinatorRuntime, RuntimeSettings};
//! use codeharness::engine::ProcessEngine;
//!
//! let engine = ProcessEngine::new("sh", vec![]);
//! let runtime = CoordinatorRuntime::start(engine, RuntimeSettings::default())?;
//! let coordinator = runtime.coordinator();
//!
//! let pending = coordinator.submit_code("echo hello");
//! // ... poll coordinator.lookup(pending.id()) until done ...
//! runtime.shutdown().await;
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod logging;
pub mod panic;
pub mod queue;
pub mod reconciler;
pub mod response;
pub mod service;
pub mod store;
pub mod task;
pub mod worker;

/// Version of the CodeHarness library and server.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
