//! Glue between the command line and the library crates.

pub(crate) mod data_dir;
pub(crate) mod fetch;
pub(crate) mod frames;
