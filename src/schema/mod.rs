//! Presentation document validation.

pub mod validate;
