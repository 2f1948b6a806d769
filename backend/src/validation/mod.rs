//! Input validation for request payloads.
//!
//! Field rules are declared with `validator` derives on the payload types;
//! cross-field rules live in [`rules`].

pub mod rules;

pub use validator::Validate;
