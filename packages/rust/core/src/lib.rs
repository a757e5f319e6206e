//! Core pipeline and domain logic for the advisory generator.
//!
//! This crate ties together record loading, page rendering, and index
//! building into the end-to-end [`pipeline::generate`] run.

pub mod index;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod version;
