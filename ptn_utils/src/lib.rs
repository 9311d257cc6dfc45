//! Shared infrastructure for the node crates.

pub mod feed;

pub use feed::Feed;
