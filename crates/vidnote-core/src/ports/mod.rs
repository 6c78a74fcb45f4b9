//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from infrastructure. They use
//! only domain types; process and filesystem details stay in the adapters.

pub mod fetch;

pub use fetch::{FetchError, FetchRequest, MediaFetcher, ProgressSink};
