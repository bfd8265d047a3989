//! Engine internals

pub mod config;
pub mod iam;
