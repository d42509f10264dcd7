//! tally-core library.
//!
//! Turns a repository's issue list into per-area daily rollups and the
//! curated issue lists that make up a tally report.
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`error::Result`]; the binary
//!   wraps them in `anyhow`.
//! - **Logging**: `tracing` macros only. Installing a subscriber is the
//!   binary's job.

#![forbid(unsafe_code)]

pub mod areas;
pub mod config;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod lock;
pub mod model;
pub mod normalize;
pub mod report;
pub mod rollup;
pub mod select;
pub mod timing;

pub use error::{ErrorCode, Result, TallyError};
