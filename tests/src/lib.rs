//! # LaneLink Test Suite
//!
//! Unified test crate containing cross-module integration scenarios:
//!
//! ```text
//! tests/src/
//! └── integration/      # Multi-round commit flows, pipelining,
//!                       # staleness races, factory bootstrap
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lanelink-tests
//!
//! # By scenario
//! cargo test -p lanelink-tests integration::commit_flow
//! ```

#[cfg(test)]
mod integration;
