//! Command-line interface for arcscope

pub mod args;

pub use args::Args;
