#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfg-inherit
//!
//! Inheritance graph construction and resolution for config structs.
//!
//! A struct declared as `Child : struct.begin {refkey=Parent}` extends
//! `Parent`. This crate records those edges, answers ancestry and descendant
//! queries over them, and walks parent chains to find where a field or
//! nested section is actually declared. Malformed data with reference cycles
//! is tolerated: every walk tracks what it has visited and stops on a repeat.

/// Parent-chain iteration.
pub mod chain;
/// Child to parent edges collected from `refkey` declarations.
pub mod graph;
/// Ancestry, descendant and chain lookup queries.
pub mod resolver;

pub use chain::Ancestors;
pub use graph::InheritanceGraph;
pub use resolver::{AncestryQuery, Resolver};

use thiserror::Error;

/// Errors that can occur when building inheritance graphs
#[derive(Error, Debug)]
pub enum Error {
    #[error("Text error: {0}")]
    Text(#[from] cfg_text::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
