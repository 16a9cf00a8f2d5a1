//! End-to-End Integration Tests
//!
//! These tests run the complete dirgate stack (configuration, router,
//! stores, codec, evaluator) over in-memory gateways.

mod directory;
mod permissions;
mod routing;
