//! Application core: domain orchestration, zero direct I/O.
//!
//! This module holds the rules for the dashboard session: the snapshot
//! owner ([`service`]), the operator command set, the outbound events and
//! the demo/live orchestration loops ([`runner`]).  All interaction with
//! stores, clocks and files happens through **port traits** defined in
//! [`ports`], keeping this layer testable with in-memory adapters.

pub mod commands;
pub mod events;
pub mod inbox;
pub mod ports;
pub mod runner;
pub mod service;
