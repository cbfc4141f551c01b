#![doc = include_str!("../../../README.md")]
//!

//! This crate re-exports the runlog core library.

pub use runlog_core::*;
