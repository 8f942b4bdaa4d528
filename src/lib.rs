//! Greenhouse dashboard core.
//!
//! Exposes the domain model, the telemetry simulator, the auto-control
//! evaluator, the realtime sync gateway and the orchestration loops for
//! the binary and for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod gateway;
pub mod model;
pub mod sensors;
pub mod state;
