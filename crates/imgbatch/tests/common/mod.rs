//! Shared test utilities for imgbatch integration tests.
//!
//! - `TestHarness`: isolated storage root, in-memory job store, runner and service
//! - `ImageServer`: local HTTP server serving generated images and a webhook sink

pub mod harness;
pub mod server;

pub use harness::TestHarness;
pub use server::ImageServer;
