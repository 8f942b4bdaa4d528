//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the in-process [`MemoryStore`](growdash::adapters::memory_store::MemoryStore).
//! Nothing here touches the network.

mod gateway_tests;
mod live_session_tests;
mod mock_store;
