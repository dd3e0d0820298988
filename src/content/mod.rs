//! The content store: a relational catalog of pages and blocks, plus one
//! JSON payload file per block.

pub mod catalog;
pub mod data;
pub mod model;
pub mod payload;
pub mod reconcile;

pub use payload::PayloadStore;
