#![warn(clippy::pedantic)]
// Binary crate with internal library: all callers are us.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod error;
pub mod filter;
pub mod graph;
pub mod key;
pub mod loader;
pub mod logger;
pub mod query;
pub mod render;
pub mod report;
pub mod session;
pub mod stats;
