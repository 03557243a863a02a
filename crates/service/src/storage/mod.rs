//! Storage abstractions for the service layer
//!
//! File-backed stores used by the response cache.

pub mod json_map_store;
