//! Transaction validation pipeline.
//!
//! Structural, fee, signature and payload-coherence checks, evaluated in a
//! fixed order with first-failure-wins semantics. The validator is pure with
//! respect to its injected queries: it never mutates state, so the mempool
//! and the contract processor can call it concurrently.

pub mod code;
pub mod validate;

pub use code::ValidationCode;
pub use validate::Validate;
